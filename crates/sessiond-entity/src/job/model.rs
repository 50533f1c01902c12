//! Job entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sessiond_core::AppResult;
use sessiond_core::types::id::JobId;

use super::payload::JobPayload;
use super::status::JobStatus;

/// A row in the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Job type (e.g. `"session:expire"`).
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Current status.
    pub status: JobStatus,
    /// Executions started so far.
    pub attempts: i32,
    /// Executions allowed before the job is marked failed.
    pub max_attempts: i32,
    /// Earliest time the job may run.
    pub scheduled_at: DateTime<Utc>,
    /// When the current attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last failure message.
    pub error_message: Option<String>,
    /// Worker that claimed the job.
    pub worker_id: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Whether another attempt is allowed after the current one fails.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Whether this job is running and its attempt started longer than
    /// `lease` before `now`.
    pub fn lease_expired(&self, now: DateTime<Utc>, lease: Duration) -> bool {
        self.status == JobStatus::Running && self.started_at.is_some_and(|t| t + lease < now)
    }

    /// Decode the payload into its typed form.
    pub fn decode_payload<P: JobPayload>(&self) -> AppResult<P> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Data required to create a new job.
#[derive(Debug, Clone)]
pub struct CreateJob {
    /// Job type.
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Maximum attempts.
    pub max_attempts: i32,
    /// Earliest run time. `None` means now.
    pub scheduled_at: Option<DateTime<Utc>>,
}
