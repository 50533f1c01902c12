//! Convenience result type alias for sessiond.

use crate::error::AppError;

/// A specialized `Result` type for sessiond operations.
pub type AppResult<T> = Result<T, AppError>;
