//! Typed payloads for the known job types.
//!
//! Field names match what operational tooling expects in the stored JSON
//! (`session_id`, `user_id`, `username`, `success`, `reason`, `ip`,
//! `user_agent`).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use sessiond_core::types::id::{LoginEventId, SessionId, UserId};
use sessiond_core::types::session::ClientMeta;

use crate::audit::{CreateLoginEvent, LoginReason};

/// Queue carrying deferred session expiry.
pub const QUEUE_SESSIONS: &str = "sessions";
/// Queue carrying login audit writes.
pub const QUEUE_AUDIT: &str = "audit";
/// Queue carrying periodic maintenance.
pub const QUEUE_MAINTENANCE: &str = "maintenance";

/// A payload bound to one job type and queue.
pub trait JobPayload: Serialize + DeserializeOwned + Send + Sync {
    /// Job type string stored in `jobs.job_type`.
    const JOB_TYPE: &'static str;
    /// Queue the job is placed on.
    const QUEUE: &'static str;

    /// Serialize for enqueueing.
    fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Deferred cleanup of one session at its expiry time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExpirePayload {
    /// Session to clean up.
    pub session_id: SessionId,
    /// Owner, needed to remove the index entry.
    pub user_id: UserId,
}

impl JobPayload for SessionExpirePayload {
    const JOB_TYPE: &'static str = "session:expire";
    const QUEUE: &'static str = QUEUE_SESSIONS;
}

/// Fire-and-forget login audit write.
///
/// `event_id` is fixed when the attempt happens, so redelivery of the same
/// job writes the same fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAuditPayload {
    /// Identifier of the audit fact.
    pub event_id: LoginEventId,
    /// When the attempt happened.
    pub occurred_at: DateTime<Utc>,
    /// Resolved user, absent for unknown usernames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Username as supplied.
    pub username: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Reason code.
    pub reason: String,
    /// Client origin address.
    #[serde(default)]
    pub ip: String,
    /// Client agent string.
    #[serde(default)]
    pub user_agent: String,
}

impl LoginAuditPayload {
    /// Build the payload for one login outcome.
    pub fn new(
        user_id: Option<UserId>,
        username: &str,
        reason: LoginReason,
        client: &ClientMeta,
    ) -> Self {
        Self {
            event_id: LoginEventId::new(),
            occurred_at: Utc::now(),
            user_id,
            username: username.to_string(),
            success: reason.is_success(),
            reason: reason.as_str().to_string(),
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
        }
    }
}

impl From<LoginAuditPayload> for CreateLoginEvent {
    fn from(p: LoginAuditPayload) -> Self {
        Self {
            id: p.event_id,
            user_id: p.user_id,
            username: p.username,
            success: p.success,
            reason: p.reason,
            ip: p.ip,
            user_agent: p.user_agent,
            created_at: p.occurred_at,
        }
    }
}

impl JobPayload for LoginAuditPayload {
    const JOB_TYPE: &'static str = "login:audit";
    const QUEUE: &'static str = QUEUE_AUDIT;
}

/// Periodic ban-marker reconciliation. Carries no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanReconcilePayload {}

impl JobPayload for BanReconcilePayload {
    const JOB_TYPE: &'static str = "ban:reconcile";
    const QUEUE: &'static str = QUEUE_MAINTENANCE;
}

/// Periodic purge of finished jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCleanupPayload {
    /// Finished jobs older than this many days are deleted.
    pub retention_days: i64,
}

impl JobPayload for JobCleanupPayload {
    const JOB_TYPE: &'static str = "job:cleanup";
    const QUEUE: &'static str = QUEUE_MAINTENANCE;
}

/// Queue a job type belongs on. Unknown types go to maintenance.
pub fn queue_for(job_type: &str) -> &'static str {
    if job_type == SessionExpirePayload::JOB_TYPE {
        SessionExpirePayload::QUEUE
    } else if job_type == LoginAuditPayload::JOB_TYPE {
        LoginAuditPayload::QUEUE
    } else {
        QUEUE_MAINTENANCE
    }
}
