//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether `serve` also runs the worker in-process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between job queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Attempts before a job is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Cron expression (with seconds) for the ban reconciliation pass.
    #[serde(default = "default_ban_reconcile_cron")]
    pub ban_reconcile_cron: String,
    /// Finished jobs older than this are purged.
    #[serde(default = "default_retention_days")]
    pub job_retention_days: i64,
    /// A running job not settled within this many seconds is treated as
    /// abandoned by a dead worker and handed out again.
    #[serde(default = "default_job_lease")]
    pub job_lease_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            max_attempts: default_max_attempts(),
            ban_reconcile_cron: default_ban_reconcile_cron(),
            job_retention_days: default_retention_days(),
            job_lease_seconds: default_job_lease(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    10
}

fn default_poll_interval() -> u64 {
    1
}

fn default_max_attempts() -> i32 {
    5
}

fn default_ban_reconcile_cron() -> String {
    "0 */10 * * * *".to_string()
}

fn default_retention_days() -> i64 {
    7
}

fn default_job_lease() -> u64 {
    300
}
