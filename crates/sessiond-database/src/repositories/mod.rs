//! PostgreSQL repository implementations.

pub mod job;
pub mod login_event;
pub mod session;
pub mod user;

pub use job::JobRepository;
pub use login_event::LoginEventRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use sessiond_core::error::{AppError, ErrorKind};

/// Map a sqlx error, turning unique violations into conflicts.
pub(crate) fn map_write_error(e: sqlx::Error, context: &str, conflict: &str) -> AppError {
    let is_unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        AppError::with_source(ErrorKind::Conflict, conflict.to_string(), e)
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), e)
    }
}
