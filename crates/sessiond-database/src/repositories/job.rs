//! Job repository backing the worker queue.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::result::AppResult;
use sessiond_core::types::id::JobId;
use sessiond_entity::job::{CreateJob, Job, JobStatus};

/// Repository for the `jobs` table.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending job.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type, queue, payload, max_attempts, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW())) RETURNING *",
        )
        .bind(JobId::new())
        .bind(&data.job_type)
        .bind(&data.queue)
        .bind(&data.payload)
        .bind(data.max_attempts)
        .bind(data.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    /// Claim the next due job on `queue` (SKIP LOCKED for concurrent workers).
    pub async fn claim_next(&self, queue: &str, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = NOW(), worker_id = $2, \
             attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE queue = $1 AND status = 'pending' AND scheduled_at <= NOW() \
                ORDER BY scheduled_at ASC, created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(queue)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    /// Mark a job completed.
    pub async fn complete(&self, id: JobId) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = NOW(), error_message = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    /// Mark a job permanently failed.
    pub async fn fail(&self, id: JobId, error_message: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job as failed", e)
        })?;
        Ok(())
    }

    /// Put a running job back to pending, due again at `run_at`.
    pub async fn retry_at(
        &self,
        id: JobId,
        error_message: &str,
        run_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', error_message = $2, scheduled_at = $3, \
             started_at = NULL, worker_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(error_message)
        .bind(run_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to retry job", e))?;
        Ok(())
    }

    /// Running jobs whose attempt started before `cutoff`, oldest first.
    pub async fn find_stale_running(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'running' AND started_at < $1 \
             ORDER BY started_at ASC LIMIT $2",
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find stale jobs", e))
    }

    /// Move an abandoned running job to `status`, provided it is still the
    /// attempt that started at `started_at`. Returns whether the row changed.
    pub async fn release_abandoned(
        &self,
        id: JobId,
        started_at: DateTime<Utc>,
        status: JobStatus,
        error_message: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $3, error_message = $4, scheduled_at = NOW(), \
             started_at = NULL, worker_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running' AND started_at = $2",
        )
        .bind(id)
        .bind(started_at)
        .bind(status)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release abandoned job", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete finished jobs last touched before `before`.
    pub async fn cleanup_finished(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE status IN ('completed', 'failed') AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clean up jobs", e))?;
        Ok(result.rows_affected())
    }
}
