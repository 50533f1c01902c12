//! Deferred session expiry.

use async_trait::async_trait;
use serde_json::Value;

use sessiond_auth::SessionEngine;
use sessiond_auth::session::ExpireOutcome;
use sessiond_entity::job::model::Job;
use sessiond_entity::job::{JobPayload, SessionExpirePayload};

use crate::executor::{JobExecutionError, JobHandler, decode_payload};

/// Handles `session:expire` jobs
#[derive(Debug, Clone)]
pub struct SessionExpireHandler {
    engine: SessionEngine,
}

impl SessionExpireHandler {
    /// Create a new session expiry handler
    pub fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl JobHandler for SessionExpireHandler {
    fn job_type(&self) -> &'static str {
        SessionExpirePayload::JOB_TYPE
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: SessionExpirePayload = decode_payload(job)?;
        let outcome = self
            .engine
            .handle_session_expire(&payload)
            .await
            .map_err(JobExecutionError::transient)?;

        // A session that was already gone is the common case; keep it quiet.
        Ok(match outcome {
            ExpireOutcome::Expired => Some(serde_json::json!({
                "session_id": payload.session_id,
                "expired": true,
            })),
            ExpireOutcome::AlreadyGone => None,
        })
    }
}
