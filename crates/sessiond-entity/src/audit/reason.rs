//! Reason codes attached to login audit facts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome classification of a login attempt.
///
/// The codes are persisted verbatim and distinguish which store signalled
/// a ban, even though callers only ever see `UserBanned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginReason {
    /// Login succeeded.
    Success,
    /// No user with that username.
    UserNotFound,
    /// Durable ban flag set.
    UserBannedDb,
    /// Fast-store ban marker present.
    UserBannedCache,
    /// Credential did not verify.
    WrongPassword,
}

impl LoginReason {
    /// The persisted reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UserNotFound => "user_not_found",
            Self::UserBannedDb => "user_banned_db",
            Self::UserBannedCache => "user_banned_cache",
            Self::WrongPassword => "wrong_password",
        }
    }

    /// Whether this reason denotes a successful login.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for LoginReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
