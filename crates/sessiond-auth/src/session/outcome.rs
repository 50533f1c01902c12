//! Typed results of engine operations.
//!
//! Best-effort steps that fail do not fail the call. They are reported
//! as [`DegradedStep`]s on the outcome so callers and tests can see
//! exactly which inconsistency was accepted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use sessiond_core::error::AppError;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::ClientMeta;
use sessiond_entity::user::User;

/// A step whose failure is logged and swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BestEffortStep {
    /// Evicting the oldest session to honour the cap.
    Evict,
    /// Marking a ledger row revoked.
    LedgerRevoke,
    /// Scheduling the deferred expiry job.
    ScheduleExpiry,
    /// Enqueueing the login audit job.
    EnqueueAudit,
}

impl fmt::Display for BestEffortStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Evict => "evict",
            Self::LedgerRevoke => "ledger_revoke",
            Self::ScheduleExpiry => "schedule_expiry",
            Self::EnqueueAudit => "enqueue_audit",
        })
    }
}

/// A best-effort step that failed.
#[derive(Debug, Clone)]
pub struct DegradedStep {
    /// Which step.
    pub step: BestEffortStep,
    /// What went wrong.
    pub error: AppError,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: User,
    /// Freshly issued session.
    pub session_id: SessionId,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
    /// Bearer token bound to the session.
    pub token: String,
    /// Session evicted to make room, if any.
    pub evicted: Option<SessionId>,
    /// Best-effort steps that failed.
    pub degraded: Vec<DegradedStep>,
}

/// Result of logout, kick or expiry of one session.
#[derive(Debug, Clone)]
pub struct RevokeOutcome {
    /// The session torn down.
    pub session_id: SessionId,
    /// Whether this call flipped the ledger row to revoked.
    pub ledger_revoked: bool,
    /// Best-effort steps that failed.
    pub degraded: Vec<DegradedStep>,
}

impl RevokeOutcome {
    pub(crate) fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            ledger_revoked: false,
            degraded: Vec::new(),
        }
    }
}

/// Result of kicking every session of a user.
#[derive(Debug, Clone, Default)]
pub struct KickAllOutcome {
    /// Sessions removed from the fast store.
    pub kicked: Vec<SessionId>,
    /// Sessions whose fast-store removal failed.
    pub failures: Vec<(SessionId, AppError)>,
    /// Best-effort steps that failed on kicked sessions.
    pub degraded: Vec<DegradedStep>,
}

impl KickAllOutcome {
    /// Whether every member was removed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One live session as listed for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    /// Session id.
    pub session_id: SessionId,
    /// When it was issued.
    pub created_at: DateTime<Utc>,
    /// When it expires.
    pub expires_at: DateTime<Utc>,
    /// Client that logged in.
    pub client: ClientMeta,
}

/// The identity behind an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Authenticated user.
    pub user_id: UserId,
    /// Session the request runs under.
    pub session_id: SessionId,
}

/// What the deferred expiry handler found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireOutcome {
    /// The live record was still present and has been removed.
    Expired,
    /// Logout, kick or the store TTL got there first.
    AlreadyGone,
}

/// Totals from one ban reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BanReconcileReport {
    /// Markers written for durably banned users.
    pub markers_set: usize,
    /// Markers removed for users no longer banned.
    pub markers_cleared: usize,
    /// Live sessions of banned users torn down.
    pub sessions_kicked: usize,
}
