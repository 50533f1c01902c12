//! Built-in job handler implementations.

pub mod ban_reconcile;
pub mod job_cleanup;
pub mod login_audit;
pub mod session_expire;

pub use ban_reconcile::BanReconcileHandler;
pub use job_cleanup::JobCleanupHandler;
pub use login_audit::LoginAuditHandler;
pub use session_expire::SessionExpireHandler;
