//! Background job entities.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateJob, Job};
pub use payload::{
    BanReconcilePayload, JobCleanupPayload, JobPayload, LoginAuditPayload, SessionExpirePayload,
};
pub use status::JobStatus;
