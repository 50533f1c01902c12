//! PostgreSQL-backed job queue.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use sessiond_core::result::AppResult;
use sessiond_core::traits::JobScheduler;
use sessiond_core::types::id::JobId;
use sessiond_database::repositories::JobRepository;
use sessiond_entity::job::payload::queue_for;
use sessiond_entity::job::{CreateJob, Job, JobPayload, JobStatus};

/// Longest delay between two attempts of the same job.
const MAX_RETRY_DELAY_SECS: i64 = 300;

/// Delay before the next attempt after `attempts` failed ones:
/// 2, 4, 8 ... seconds, capped at five minutes.
pub fn retry_delay(attempts: i32) -> Duration {
    let exp = attempts.clamp(1, 16) as u32;
    Duration::seconds((1_i64 << exp).min(MAX_RETRY_DELAY_SECS))
}

/// Job queue for enqueuing and dequeuing work.
#[derive(Debug, Clone)]
pub struct JobQueue {
    repo: Arc<JobRepository>,
    worker_id: String,
    max_attempts: i32,
}

impl JobQueue {
    /// Create a job queue. `max_attempts` applies to every job enqueued
    /// through it.
    pub fn new(repo: Arc<JobRepository>, worker_id: impl Into<String>, max_attempts: i32) -> Self {
        Self {
            repo,
            worker_id: worker_id.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// This queue's worker identifier.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Enqueue a raw job on the queue its type belongs to.
    pub async fn push_raw(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> AppResult<Job> {
        let job = self
            .repo
            .create(&CreateJob {
                job_type: job_type.to_string(),
                queue: queue_for(job_type).to_string(),
                payload,
                max_attempts: self.max_attempts,
                scheduled_at,
            })
            .await?;

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            queue = %job.queue,
            scheduled_at = %job.scheduled_at,
            "Enqueued job"
        );
        Ok(job)
    }

    /// Enqueue a typed payload.
    pub async fn push<P: JobPayload>(
        &self,
        payload: &P,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> AppResult<Job> {
        self.push_raw(P::JOB_TYPE, payload.to_value()?, scheduled_at)
            .await
    }

    /// Claim the next due job from the given queues, in order.
    pub async fn dequeue(&self, queues: &[&str]) -> AppResult<Option<Job>> {
        for queue in queues {
            if let Some(job) = self.repo.claim_next(queue, &self.worker_id).await? {
                debug!(job_id = %job.id, job_type = %job.job_type, queue = %job.queue, "Dequeued job");
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Mark a job as completed.
    pub async fn complete(&self, job_id: JobId) -> AppResult<()> {
        self.repo.complete(job_id).await?;
        debug!(job_id = %job_id, "Job completed");
        Ok(())
    }

    /// Mark a job as permanently failed.
    pub async fn fail(&self, job_id: JobId, error: &str) -> AppResult<()> {
        self.repo.fail(job_id, error).await?;
        debug!(job_id = %job_id, error = %error, "Job failed");
        Ok(())
    }

    /// Return a job to pending, due again at `run_at`.
    pub async fn retry_at(&self, job_id: JobId, error: &str, run_at: DateTime<Utc>) -> AppResult<()> {
        self.repo.retry_at(job_id, error, run_at).await?;
        debug!(job_id = %job_id, run_at = %run_at, "Job scheduled for retry");
        Ok(())
    }

    /// Running jobs whose lease ran out, at most `limit` of them.
    pub async fn abandoned(&self, lease: Duration, limit: i64) -> AppResult<Vec<Job>> {
        self.repo.find_stale_running(Utc::now() - lease, limit).await
    }

    /// Settle an abandoned job as `status` unless its attempt finished in
    /// the meantime.
    pub async fn release_abandoned(&self, job: &Job, status: JobStatus, error: &str) -> AppResult<bool> {
        let Some(started_at) = job.started_at else {
            return Ok(false);
        };
        self.repo
            .release_abandoned(job.id, started_at, status, error)
            .await
    }

    /// Delete finished jobs last updated before `before`.
    pub async fn purge_finished(&self, before: DateTime<Utc>) -> AppResult<u64> {
        self.repo.cleanup_finished(before).await
    }
}

#[async_trait]
impl JobScheduler for JobQueue {
    async fn schedule_at(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        when: DateTime<Utc>,
    ) -> AppResult<()> {
        self.push_raw(job_type, payload, Some(when)).await.map(|_| ())
    }

    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> AppResult<()> {
        self.push_raw(job_type, payload, None).await.map(|_| ())
    }
}
