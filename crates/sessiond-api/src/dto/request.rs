//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use sessiond_core::types::id::SessionId;

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Username.
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request body. Not validated: an empty field is just a failed
/// login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Admin kick request: one session, or every session with `all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KickRequest {
    /// Session to terminate.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Terminate every session of the user.
    #[serde(default)]
    pub all: bool,
}

/// What a [`KickRequest`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickTarget {
    /// One session.
    One(SessionId),
    /// Every session.
    All,
}

impl KickRequest {
    /// Resolve the target. Exactly one of `session_id` and `all` must be set.
    pub fn target(&self) -> Option<KickTarget> {
        match (self.session_id, self.all) {
            (Some(sid), false) => Some(KickTarget::One(sid)),
            (None, true) => Some(KickTarget::All),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kick_target_requires_exactly_one_selector() {
        let sid = SessionId::new();
        let one: KickRequest = serde_json::from_value(serde_json::json!({"session_id": sid})).unwrap();
        assert_eq!(one.target(), Some(KickTarget::One(sid)));

        let all: KickRequest = serde_json::from_value(serde_json::json!({"all": true})).unwrap();
        assert_eq!(all.target(), Some(KickTarget::All));

        let both = KickRequest { session_id: Some(sid), all: true };
        assert_eq!(both.target(), None);
        assert_eq!(KickRequest::default().target(), None);
    }

    #[test]
    fn signup_rejects_empty_and_overlong_usernames() {
        let ok = SignupRequest { username: "alice".into(), password: "pw".into() };
        assert!(ok.validate().is_ok());

        let empty = SignupRequest { username: String::new(), password: "pw".into() };
        assert!(empty.validate().is_err());

        let long = SignupRequest { username: "a".repeat(65), password: "pw".into() };
        assert!(long.validate().is_err());
    }
}
