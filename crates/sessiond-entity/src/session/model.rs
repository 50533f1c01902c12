//! Ledger record for an issued session.
//!
//! The ledger is audit history. It is never consulted for liveness and is
//! never auto-deleted; a row is written once at login and revoked at most
//! once afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::{LiveSession, RevokedBy};

/// A row in the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Session identifier (shared with the live record).
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// When the session was issued.
    pub created_at: DateTime<Utc>,
    /// When the session was due to expire.
    pub expires_at: DateTime<Utc>,
    /// When the session was revoked, if ever.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Actor that revoked it, as stored (`user`, `admin:kick`, ...).
    pub revoked_by: Option<String>,
}

impl SessionRecord {
    /// Whether a revocation has been recorded.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// The parsed revocation actor.
    pub fn revoked_by(&self) -> Option<RevokedBy> {
        self.revoked_by.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Insert shape for a ledger row.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

impl From<&LiveSession> for NewSessionRecord {
    fn from(live: &LiveSession) -> Self {
        Self {
            id: live.session_id,
            user_id: live.user_id,
            created_at: live.created_at,
            expires_at: live.expires_at,
        }
    }
}
