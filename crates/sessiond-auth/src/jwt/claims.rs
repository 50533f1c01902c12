//! JWT claims carried by every bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sessiond_core::types::id::{SessionId, UserId};

/// Claims payload embedded in a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    /// Session this token is bound to. Absent for unbound tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionId>,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token id.
    pub jti: Uuid,
}

impl Claims {
    /// Claims for a session-bound token expiring at `expires_at`.
    pub fn for_session(user_id: UserId, session_id: SessionId, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            sid: Some(session_id),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Remaining lifetime in seconds, zero once expired.
    pub fn remaining_ttl_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}
