//! Job executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use sessiond_core::error::AppError;
use sessiond_entity::job::{Job, JobPayload};

/// Trait for job handler implementations.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job type this handler processes.
    fn job_type(&self) -> &'static str;

    /// Execute the job. `Some(value)` is a summary that gets logged.
    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, do not retry.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, may retry.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether the runner may schedule another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Store failures are assumed to clear up on their own.
    pub fn transient(e: AppError) -> Self {
        Self::Transient(e.to_string())
    }
}

/// Decode a job's payload. A payload that does not fit its type can never
/// succeed, so the failure is permanent.
pub fn decode_payload<P: JobPayload>(job: &Job) -> Result<P, JobExecutionError> {
    job.decode_payload::<P>().map_err(|e| {
        JobExecutionError::Permanent(format!("Malformed {} payload: {}", job.job_type, e.message))
    })
}

/// Dispatches jobs to the appropriate handler based on `job_type`.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler, replacing any previous one for its type.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type();
        if self.handlers.insert(job_type.to_string(), handler).is_some() {
            warn!(job_type, "Replaced existing job handler");
        } else {
            info!(job_type, "Registered job handler");
        }
    }

    /// Execute a job by dispatching to the correct handler.
    pub async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let handler = self.handlers.get(&job.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                job.job_type
            ))
        })?;

        handler.execute(job).await
    }

    /// Check if a handler is registered for a job type.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// The registered job types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
