//! Value types for the live (fast-store) view of a session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{SessionId, UserId};

/// Client metadata captured at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    /// Origin address as reported by the transport.
    pub ip: String,
    /// Client agent string.
    pub user_agent: String,
}

impl ClientMeta {
    /// Build client metadata from its parts.
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// A live session record as held by the fast store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    /// Session identifier.
    pub session_id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// When the session was issued.
    pub created_at: DateTime<Utc>,
    /// When the fast store drops the record.
    pub expires_at: DateTime<Utc>,
    /// Client that logged in.
    pub client: ClientMeta,
}

impl LiveSession {
    /// Whether the record is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether this record belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }
}

/// Actor recorded on a revoked ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevokedBy {
    /// The owner logged out.
    #[serde(rename = "user")]
    User,
    /// An administrator kicked the session.
    #[serde(rename = "admin:kick")]
    AdminKick,
    /// Evicted to honour the per-user cap.
    #[serde(rename = "system:limit")]
    SystemLimit,
    /// Cleaned up by the deferred expiry job.
    #[serde(rename = "system:expire")]
    SystemExpire,
}

impl RevokedBy {
    /// The string persisted in the ledger's `revoked_by` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::AdminKick => "admin:kick",
            Self::SystemLimit => "system:limit",
            Self::SystemExpire => "system:expire",
        }
    }
}

impl fmt::Display for RevokedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevokedBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin:kick" => Ok(Self::AdminKick),
            "system:limit" => Ok(Self::SystemLimit),
            "system:expire" => Ok(Self::SystemExpire),
            other => Err(format!("unknown revocation actor '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoked_by_round_trips_through_column_value() {
        for actor in [
            RevokedBy::User,
            RevokedBy::AdminKick,
            RevokedBy::SystemLimit,
            RevokedBy::SystemExpire,
        ] {
            assert_eq!(actor.as_str().parse::<RevokedBy>(), Ok(actor));
        }
        assert!("admin".parse::<RevokedBy>().is_err());
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let live = LiveSession {
            session_id: SessionId::new(),
            user_id: UserId::new(),
            created_at: now,
            expires_at: now,
            client: ClientMeta::default(),
        };
        assert!(live.is_expired_at(now));
    }
}
