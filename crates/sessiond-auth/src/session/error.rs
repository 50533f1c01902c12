//! Caller-facing classification of engine failures.

use std::fmt;

use thiserror::Error;

use sessiond_core::error::AppError;

/// Why an authenticated request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSession {
    /// The token failed signature or expiry checks.
    BadToken,
    /// The token is valid but not bound to a session.
    NoSession,
    /// The session is not live, or belongs to someone else.
    NotLive,
}

impl InvalidSession {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadToken => "invalid_token",
            Self::NoSession => "invalid_token_no_session",
            Self::NotLive => "session_invalid",
        }
    }
}

impl fmt::Display for InvalidSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result classification for session engine operations.
///
/// Wrong password and unknown username both map to
/// [`SessionError::InvalidCredentials`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Bad username or password.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// The account is banned.
    #[error("User is banned")]
    UserBanned,
    /// The request's session is not usable.
    #[error("Session invalid: {0}")]
    SessionInvalid(InvalidSession),
    /// A store or codec failure on a mandatory step.
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl SessionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::UserBanned => "user_banned",
            Self::SessionInvalid(reason) => reason.code(),
            Self::Internal(_) => "internal_error",
        }
    }
}
