//! Session ledger entities.

pub mod model;

pub use model::{NewSessionRecord, SessionRecord};
