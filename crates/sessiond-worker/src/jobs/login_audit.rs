//! Login audit writes.

use async_trait::async_trait;
use serde_json::Value;

use sessiond_auth::SessionEngine;
use sessiond_entity::job::model::Job;
use sessiond_entity::job::{JobPayload, LoginAuditPayload};

use crate::executor::{JobExecutionError, JobHandler, decode_payload};

/// Handles `login:audit` jobs
#[derive(Debug, Clone)]
pub struct LoginAuditHandler {
    engine: SessionEngine,
}

impl LoginAuditHandler {
    /// Create a new login audit handler
    pub fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl JobHandler for LoginAuditHandler {
    fn job_type(&self) -> &'static str {
        LoginAuditPayload::JOB_TYPE
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: LoginAuditPayload = decode_payload(job)?;
        self.engine
            .record_login_event(payload)
            .await
            .map_err(JobExecutionError::transient)?;
        Ok(None)
    }
}
