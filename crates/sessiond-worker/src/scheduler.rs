//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler as CronEngine};
use tracing;

use sessiond_core::config::WorkerConfig;
use sessiond_core::error::AppError;
use sessiond_entity::job::{BanReconcilePayload, JobCleanupPayload, JobPayload};

use crate::queue::JobQueue;

/// Daily at 03:30.
const JOB_CLEANUP_CRON: &str = "0 30 3 * * *";

/// Cron-based scheduler that enqueues periodic jobs.
pub struct CronScheduler {
    scheduler: CronEngine,
    queue: Arc<JobQueue>,
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("ban_reconcile_cron", &self.config.ban_reconcile_cron)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(queue: Arc<JobQueue>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = CronEngine::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            queue,
            config,
        })
    }

    /// Register the ban reconciliation and job cleanup schedules.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        let reconcile_cron = self.config.ban_reconcile_cron.clone();
        self.register(&reconcile_cron, BanReconcilePayload::default())
            .await?;
        self.register(
            JOB_CLEANUP_CRON,
            JobCleanupPayload {
                retention_days: self.config.job_retention_days,
            },
        )
        .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Enqueue a copy of `payload` every time `cron` fires.
    async fn register<P>(&self, cron: &str, payload: P) -> Result<(), AppError>
    where
        P: JobPayload + Clone + 'static,
    {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            let payload = payload.clone();
            Box::pin(async move {
                tracing::debug!(job_type = P::JOB_TYPE, "Scheduling periodic job");
                if let Err(e) = queue.push(&payload, None).await {
                    tracing::error!(job_type = P::JOB_TYPE, error = %e, "Failed to enqueue periodic job");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                cron,
                P::JOB_TYPE,
                e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", P::JOB_TYPE, e))
        })?;

        tracing::info!(job_type = P::JOB_TYPE, cron, "Registered periodic job");
        Ok(())
    }
}
