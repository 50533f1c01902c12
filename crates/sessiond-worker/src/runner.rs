//! Worker runner: polls the queues and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use sessiond_core::config::WorkerConfig;
use sessiond_entity::job::{Job, JobStatus};
use sessiond_entity::job::payload::{QUEUE_AUDIT, QUEUE_MAINTENANCE, QUEUE_SESSIONS};

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::{JobQueue, retry_delay};

/// Grace period for in-flight jobs at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the runner looks for jobs abandoned by dead workers.
const RECLAIM_INTERVAL: Duration = Duration::from_secs(60);

/// Abandoned jobs handled per reclaim pass.
const RECLAIM_BATCH: i64 = 100;

/// What to do with a job once its handler returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Mark completed.
    Complete,
    /// Back to pending, due at `run_at`.
    Retry {
        /// Failure message kept on the row.
        message: String,
        /// Next attempt time.
        run_at: DateTime<Utc>,
    },
    /// Mark failed for good.
    Fail {
        /// Failure message kept on the row.
        message: String,
    },
}

impl Settlement {
    /// Decide the fate of `job` given its handler's result. `job.attempts`
    /// already counts the attempt that just ran.
    pub fn decide(
        job: &Job,
        result: &Result<Option<Value>, JobExecutionError>,
        now: DateTime<Utc>,
    ) -> Self {
        match result {
            Ok(_) => Self::Complete,
            Err(e) if e.is_retryable() && job.can_retry() => Self::Retry {
                message: e.to_string(),
                run_at: now + retry_delay(job.attempts),
            },
            Err(e) => Self::Fail {
                message: e.to_string(),
            },
        }
    }

    /// Decide the fate of a job whose worker stopped settling it. The lost
    /// attempt counts, so the job runs again only while attempts remain.
    pub fn for_abandoned(job: &Job, now: DateTime<Utc>) -> Self {
        let message = format!(
            "lease expired on worker {}",
            job.worker_id.as_deref().unwrap_or("unknown")
        );
        if job.can_retry() {
            Self::Retry {
                message,
                run_at: now,
            }
        } else {
            Self::Fail { message }
        }
    }
}

/// Main worker runner that polls queues and executes jobs.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
    queues: Vec<String>,
}

impl WorkerRunner {
    /// Create a runner polling the sessions, audit and maintenance queues.
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor>, config: WorkerConfig) -> Self {
        Self {
            queue,
            executor,
            config,
            queues: vec![
                QUEUE_SESSIONS.to_string(),
                QUEUE_AUDIT.to_string(),
                QUEUE_MAINTENANCE.to_string(),
            ],
        }
    }

    /// Run until the cancel signal flips to `true`, then drain in-flight
    /// jobs for up to thirty seconds.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        info!(
            worker_id = %self.queue.worker_id(),
            concurrency,
            poll_interval_seconds = self.config.poll_interval_seconds,
            queues = ?self.queues,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));
        let mut last_reclaim: Option<time::Instant> = None;

        loop {
            if *cancel.borrow() {
                break;
            }

            if last_reclaim.is_none_or(|at| at.elapsed() >= RECLAIM_INTERVAL) {
                self.reclaim_abandoned().await;
                last_reclaim = Some(time::Instant::now());
            }

            let claimed = self.poll_and_execute(&semaphore).await;
            if claimed {
                // More work may be waiting; poll again straight away.
                continue;
            }

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        info!(worker_id = %self.queue.worker_id(), "Worker waiting for in-flight jobs");
        let permits = u32::try_from(concurrency).unwrap_or(u32::MAX);
        if time::timeout(DRAIN_TIMEOUT, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            warn!("Timed out waiting for in-flight jobs");
        }
        info!(worker_id = %self.queue.worker_id(), "Worker shut down");
    }

    /// Hand jobs abandoned by dead workers back to the queue, or fail them
    /// when no attempts remain.
    async fn reclaim_abandoned(&self) {
        let lease = chrono::Duration::seconds(
            i64::try_from(self.config.job_lease_seconds).unwrap_or(i64::MAX),
        );
        let jobs = match self.queue.abandoned(lease, RECLAIM_BATCH).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "Failed to look up abandoned jobs");
                return;
            }
        };

        let now = Utc::now();
        for job in jobs.iter().filter(|j| j.lease_expired(now, lease)) {
            let (status, message) = match Settlement::for_abandoned(job, now) {
                Settlement::Retry { message, .. } => (JobStatus::Pending, message),
                Settlement::Fail { message } => (JobStatus::Failed, message),
                Settlement::Complete => continue,
            };
            match self.queue.release_abandoned(job, status, &message).await {
                Ok(true) => warn!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    attempts = job.attempts,
                    status = ?status,
                    "Reclaimed abandoned job"
                ),
                Ok(false) => {}
                Err(e) => error!(job_id = %job.id, error = %e, "Failed to reclaim abandoned job"),
            }
        }
    }

    /// Claim one job and spawn its execution. Returns whether a job was
    /// claimed.
    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) -> bool {
        let Ok(permit) = semaphore.clone().try_acquire_owned() else {
            trace!("All worker slots occupied");
            return false;
        };

        let queue_refs: Vec<&str> = self.queues.iter().map(String::as_str).collect();
        let job = match self.queue.dequeue(&queue_refs).await {
            Ok(Some(job)) => job,
            Ok(None) => return false,
            Err(e) => {
                error!(error = %e, "Failed to dequeue job");
                return false;
            }
        };

        let queue = Arc::clone(&self.queue);
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let _permit = permit;
            process(&queue, &executor, job).await;
        });
        true
    }
}

async fn process(queue: &JobQueue, executor: &JobExecutor, job: Job) {
    debug!(
        job_id = %job.id,
        job_type = %job.job_type,
        attempt = job.attempts,
        max_attempts = job.max_attempts,
        "Processing job"
    );

    let result = executor.execute(&job).await;
    let settled = match Settlement::decide(&job, &result, Utc::now()) {
        Settlement::Complete => {
            if let Ok(Some(summary)) = &result {
                info!(job_id = %job.id, job_type = %job.job_type, summary = %summary, "Job completed");
            }
            queue.complete(job.id).await
        }
        Settlement::Retry { message, run_at } => {
            warn!(job_id = %job.id, job_type = %job.job_type, error = %message, run_at = %run_at, "Job failed, will retry");
            queue.retry_at(job.id, &message, run_at).await
        }
        Settlement::Fail { message } => {
            error!(job_id = %job.id, job_type = %job.job_type, error = %message, "Job failed permanently");
            queue.fail(job.id, &message).await
        }
    };

    if let Err(e) = settled {
        error!(job_id = %job.id, error = %e, "Failed to record job outcome");
    }
}
