//! Purge of finished jobs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use tracing;

use sessiond_entity::job::model::Job;
use sessiond_entity::job::{JobCleanupPayload, JobPayload};

use crate::executor::{JobExecutionError, JobHandler, decode_payload};
use crate::queue::JobQueue;

/// Handles `job:cleanup` jobs
#[derive(Debug, Clone)]
pub struct JobCleanupHandler {
    queue: Arc<JobQueue>,
}

impl JobCleanupHandler {
    /// Create a new job cleanup handler
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self { queue }
    }
}

/// Jobs finished before this instant are purged. Zero or negative retention
/// is refused so a bad payload cannot wipe the whole history.
pub fn cleanup_cutoff(
    payload: &JobCleanupPayload,
    now: chrono::DateTime<Utc>,
) -> Result<chrono::DateTime<Utc>, JobExecutionError> {
    if payload.retention_days < 1 {
        return Err(JobExecutionError::Permanent(format!(
            "retention_days must be at least 1, got {}",
            payload.retention_days
        )));
    }
    Ok(now - Duration::days(payload.retention_days))
}

#[async_trait]
impl JobHandler for JobCleanupHandler {
    fn job_type(&self) -> &'static str {
        JobCleanupPayload::JOB_TYPE
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: JobCleanupPayload = decode_payload(job)?;
        let before = cleanup_cutoff(&payload, Utc::now())?;

        let removed = self
            .queue
            .purge_finished(before)
            .await
            .map_err(JobExecutionError::transient)?;

        tracing::info!(removed, before = %before, "Purged finished jobs");
        Ok(Some(serde_json::json!({ "removed": removed })))
    }
}
