//! Memory-backed engine plus an executor with every session handler.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use sessiond_auth::SessionEngine;
use sessiond_auth::jwt::JwtCodec;
use sessiond_cache::memory::MemorySessionCache;
use sessiond_core::config::{AuthConfig, SessionConfig};
use sessiond_core::result::AppResult;
use sessiond_core::traits::{CredentialVerifier, JobScheduler};
use sessiond_core::types::id::JobId;
use sessiond_core::types::session::ClientMeta;
use sessiond_database::AccountStore;
use sessiond_database::memory::MemoryLedger;
use sessiond_entity::job::payload::queue_for;
use sessiond_entity::job::{Job, JobStatus};
use sessiond_entity::user::{CreateUser, User};
use sessiond_worker::JobExecutor;
use sessiond_worker::jobs::{BanReconcileHandler, LoginAuditHandler, SessionExpireHandler};

#[derive(Debug, Default)]
pub struct PlainVerifier;

#[async_trait]
impl CredentialVerifier for PlainVerifier {
    async fn verify(&self, stored_hash: &str, supplied: &str) -> AppResult<bool> {
        Ok(stored_hash == supplied)
    }
}

/// Captures jobs as claimed rows so tests can hand them to the executor.
#[derive(Debug, Default)]
pub struct CapturingScheduler {
    jobs: Mutex<Vec<Job>>,
}

impl CapturingScheduler {
    /// Remove and return every captured job of `job_type`.
    pub async fn take(&self, job_type: &str) -> Vec<Job> {
        let mut jobs = self.jobs.lock().await;
        let (taken, kept): (Vec<Job>, Vec<Job>) =
            jobs.drain(..).partition(|j| j.job_type == job_type);
        *jobs = kept;
        taken
    }

    async fn capture(&self, job_type: &str, payload: serde_json::Value, at: DateTime<Utc>) {
        self.jobs.lock().await.push(job_row(job_type, payload, at));
    }
}

#[async_trait]
impl JobScheduler for CapturingScheduler {
    async fn schedule_at(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        when: DateTime<Utc>,
    ) -> AppResult<()> {
        self.capture(job_type, payload, when).await;
        Ok(())
    }

    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> AppResult<()> {
        self.capture(job_type, payload, Utc::now()).await;
        Ok(())
    }
}

/// A job row as the runner would see it right after claiming.
pub fn job_row(job_type: &str, payload: serde_json::Value, scheduled_at: DateTime<Utc>) -> Job {
    let now = Utc::now();
    Job {
        id: JobId::new(),
        job_type: job_type.to_string(),
        queue: queue_for(job_type).to_string(),
        payload,
        status: JobStatus::Running,
        attempts: 1,
        max_attempts: 5,
        scheduled_at,
        started_at: Some(now),
        completed_at: None,
        error_message: None,
        worker_id: Some("test-worker".to_string()),
        created_at: now,
        updated_at: now,
    }
}

pub fn client() -> ClientMeta {
    ClientMeta::new("198.51.100.4", "worker-test/1.0")
}

pub struct Harness {
    pub engine: SessionEngine,
    pub ledger: MemoryLedger,
    pub cache: Arc<MemorySessionCache>,
    pub jobs: Arc<CapturingScheduler>,
    pub executor: JobExecutor,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = MemoryLedger::new();
        let cache = Arc::new(MemorySessionCache::default());
        let jobs = Arc::new(CapturingScheduler::default());
        let codec = Arc::new(JwtCodec::new(&AuthConfig {
            jwt_secret: "worker-test-secret".to_string(),
            jwt_leeway_seconds: 0,
        }));

        let engine = SessionEngine::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            cache.clone(),
            Arc::new(PlainVerifier),
            codec,
            jobs.clone(),
            SessionConfig {
                ttl_seconds: 3600,
                max_sessions_per_user: 3,
            },
        );

        let mut executor = JobExecutor::new();
        executor.register(Arc::new(SessionExpireHandler::new(engine.clone())));
        executor.register(Arc::new(LoginAuditHandler::new(engine.clone())));
        executor.register(Arc::new(BanReconcileHandler::new(engine.clone())));

        Self {
            engine,
            ledger,
            cache,
            jobs,
            executor,
        }
    }

    pub async fn create_user(&self, username: &str, password: &str) -> User {
        self.ledger
            .create(&CreateUser {
                username: username.to_string(),
                password_hash: password.to_string(),
            })
            .await
            .unwrap()
    }
}
