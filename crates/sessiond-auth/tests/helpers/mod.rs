//! Shared harness for session engine tests.
//!
//! Everything runs against the in-memory fast store and ledger. Failing
//! and slow collaborators wrap the memory implementations.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use sessiond_auth::SessionEngine;
use sessiond_auth::jwt::JwtCodec;
use sessiond_cache::memory::MemorySessionCache;
use sessiond_core::config::{AuthConfig, SessionConfig};
use sessiond_core::error::AppError;
use sessiond_core::result::AppResult;
use sessiond_core::traits::{CredentialVerifier, JobScheduler, SessionCache};
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::{ClientMeta, LiveSession, RevokedBy};
use sessiond_database::memory::MemoryLedger;
use sessiond_database::{AccountStore, SessionLedger};
use sessiond_entity::session::{NewSessionRecord, SessionRecord};
use sessiond_entity::user::{CreateUser, User};

/// Compares the supplied password with the stored "hash" verbatim.
#[derive(Debug, Default)]
pub struct PlainVerifier;

#[async_trait]
impl CredentialVerifier for PlainVerifier {
    async fn verify(&self, stored_hash: &str, supplied: &str) -> AppResult<bool> {
        Ok(stored_hash == supplied)
    }
}

/// A job handed to the scheduler.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub job_type: String,
    pub payload: serde_json::Value,
    pub run_at: Option<DateTime<Utc>>,
}

/// Records every job instead of running it. Can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    jobs: Mutex<Vec<ScheduledJob>>,
    fail: AtomicBool,
}

impl RecordingScheduler {
    pub fn fail(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    pub async fn jobs(&self) -> Vec<ScheduledJob> {
        self.jobs.lock().await.clone()
    }

    pub async fn of_type(&self, job_type: &str) -> Vec<ScheduledJob> {
        self.jobs()
            .await
            .into_iter()
            .filter(|j| j.job_type == job_type)
            .collect()
    }

    async fn push(&self, job: ScheduledJob) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::database("job queue unavailable"));
        }
        self.jobs.lock().await.push(job);
        Ok(())
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn schedule_at(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        when: DateTime<Utc>,
    ) -> AppResult<()> {
        self.push(ScheduledJob {
            job_type: job_type.to_string(),
            payload,
            run_at: Some(when),
        })
        .await
    }

    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> AppResult<()> {
        self.push(ScheduledJob {
            job_type: job_type.to_string(),
            payload,
            run_at: None,
        })
        .await
    }
}

/// Ledger wrapper with switchable failures and an optional insert delay.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub fail_insert: AtomicBool,
    pub fail_revoke: AtomicBool,
    pub insert_delay: Mutex<Option<Duration>>,
}

#[async_trait]
impl SessionLedger for FlakyLedger {
    async fn insert(&self, record: &NewSessionRecord) -> AppResult<()> {
        let delay = *self.insert_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::database("ledger insert failed"));
        }
        self.inner.insert(record).await
    }

    async fn revoke(&self, id: &SessionId, user_id: &UserId, by: RevokedBy) -> AppResult<bool> {
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(AppError::database("ledger revoke failed"));
        }
        self.inner.revoke(id, user_id, by).await
    }

    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<SessionRecord>> {
        SessionLedger::find_by_id(&self.inner, id).await
    }
}

/// Fast-store wrapper with switchable failures.
#[derive(Debug, Default)]
pub struct FlakyCache {
    pub inner: MemorySessionCache,
    pub fail_create: AtomicBool,
    pub fail_ban_lookup: AtomicBool,
    pub fail_count: AtomicBool,
}

fn cache_down() -> AppError {
    AppError::cache("connection refused")
}

#[async_trait]
impl SessionCache for FlakyCache {
    async fn create(&self, session: &LiveSession) -> AppResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(cache_down());
        }
        self.inner.create(session).await
    }

    async fn get(&self, session_id: &SessionId) -> AppResult<Option<LiveSession>> {
        self.inner.get(session_id).await
    }

    async fn remove(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        self.inner.remove(user_id, session_id).await
    }

    async fn remove_from_index(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        self.inner.remove_from_index(user_id, session_id).await
    }

    async fn count(&self, user_id: &UserId) -> AppResult<u64> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(cache_down());
        }
        self.inner.count(user_id).await
    }

    async fn oldest(&self, user_id: &UserId) -> AppResult<Option<SessionId>> {
        self.inner.oldest(user_id).await
    }

    async fn members(&self, user_id: &UserId) -> AppResult<Vec<SessionId>> {
        self.inner.members(user_id).await
    }

    async fn set_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.inner.set_ban_marker(user_id).await
    }

    async fn clear_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.inner.clear_ban_marker(user_id).await
    }

    async fn has_ban_marker(&self, user_id: &UserId) -> AppResult<bool> {
        if self.fail_ban_lookup.load(Ordering::SeqCst) {
            return Err(cache_down());
        }
        self.inner.has_ban_marker(user_id).await
    }

    async fn ban_markers(&self) -> AppResult<Vec<UserId>> {
        self.inner.ban_markers().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        jwt_leeway_seconds: 0,
    }
}

pub fn client() -> ClientMeta {
    ClientMeta::new("203.0.113.7", "integration-test/1.0")
}

/// An engine wired to memory stores, with handles on every collaborator.
pub struct TestEngine {
    pub engine: SessionEngine,
    pub accounts: MemoryLedger,
    pub ledger: Arc<FlakyLedger>,
    pub cache: Arc<FlakyCache>,
    pub jobs: Arc<RecordingScheduler>,
    pub codec: Arc<JwtCodec>,
}

impl TestEngine {
    pub fn new(max_sessions_per_user: u32) -> Self {
        Self::with_config(SessionConfig {
            ttl_seconds: 3600,
            max_sessions_per_user,
        })
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let ledger = Arc::new(FlakyLedger::default());
        let accounts = ledger.inner.clone();
        let cache = Arc::new(FlakyCache::default());
        let jobs = Arc::new(RecordingScheduler::default());
        let codec = Arc::new(JwtCodec::new(&auth_config()));

        let engine = SessionEngine::new(
            Arc::new(accounts.clone()),
            ledger.clone(),
            Arc::new(accounts.clone()),
            cache.clone(),
            Arc::new(PlainVerifier),
            codec.clone(),
            jobs.clone(),
            config,
        );

        Self {
            engine,
            accounts,
            ledger,
            cache,
            jobs,
            codec,
        }
    }

    /// Create a user whose stored "hash" is the password itself.
    pub async fn create_user(&self, username: &str, password: &str) -> User {
        self.accounts
            .create(&CreateUser {
                username: username.to_string(),
                password_hash: password.to_string(),
            })
            .await
            .unwrap()
    }

    /// Log in and pause so the next login gets a later creation time.
    pub async fn login_ok(&self, username: &str, password: &str) -> sessiond_auth::LoginOutcome {
        let outcome = self
            .engine
            .login(username, password, client())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        outcome
    }

    pub async fn ledger_row(&self, session_id: &SessionId) -> SessionRecord {
        self.ledger.find_by_id(session_id).await.unwrap().unwrap()
    }
}
