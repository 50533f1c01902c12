//! Background job processing for sessiond.
//!
//! This crate provides:
//! - A PostgreSQL-backed job queue that the session engine schedules into
//! - A job executor that dispatches jobs to the registered handler
//! - A worker runner that polls the queues and settles each job
//! - A cron scheduler for ban reconciliation and queue housekeeping
//! - The handlers for `session:expire`, `login:audit`, `ban:reconcile`
//!   and `job:cleanup`

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::JobQueue;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
