//! Job scheduling trait consumed by the session engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Hands work to the background worker.
///
/// Delivery is at-least-once. Callers only wait for the enqueue itself,
/// never for execution.
#[async_trait]
pub trait JobScheduler: Send + Sync + 'static {
    /// Schedule `job_type` to run no earlier than `when`.
    async fn schedule_at(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        when: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Enqueue `job_type` for immediate execution.
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> AppResult<()>;
}
