//! Periodic ban-marker reconciliation.

use async_trait::async_trait;
use serde_json::Value;

use sessiond_auth::SessionEngine;
use sessiond_entity::job::model::Job;
use sessiond_entity::job::{BanReconcilePayload, JobPayload};

use crate::executor::{JobExecutionError, JobHandler, decode_payload};

/// Handles `ban:reconcile` jobs
#[derive(Debug, Clone)]
pub struct BanReconcileHandler {
    engine: SessionEngine,
}

impl BanReconcileHandler {
    /// Create a new ban reconciliation handler
    pub fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl JobHandler for BanReconcileHandler {
    fn job_type(&self) -> &'static str {
        BanReconcilePayload::JOB_TYPE
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let _: BanReconcilePayload = decode_payload(job)?;
        let report = self
            .engine
            .reconcile_ban_markers()
            .await
            .map_err(JobExecutionError::transient)?;

        Ok(Some(serde_json::json!({
            "markers_set": report.markers_set,
            "markers_cleared": report.markers_cleared,
            "sessions_kicked": report.sessions_kicked,
        })))
    }
}
