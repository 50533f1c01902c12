//! Router wired to memory stores, plus request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sessiond_api::{AppState, build_router};
use sessiond_auth::jwt::JwtCodec;
use sessiond_auth::{AccountService, SessionEngine};
use sessiond_cache::memory::MemorySessionCache;
use sessiond_core::config::{AppConfig, SessionConfig};
use sessiond_core::result::AppResult;
use sessiond_core::traits::{CredentialHasher, CredentialVerifier, JobScheduler};
use sessiond_database::memory::MemoryLedger;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Stores passwords as-is so tests skip Argon2.
#[derive(Debug, Default)]
pub struct PlainCredentials;

#[async_trait]
impl CredentialHasher for PlainCredentials {
    async fn hash(&self, password: &str) -> AppResult<String> {
        Ok(format!("plain:{password}"))
    }
}

#[async_trait]
impl CredentialVerifier for PlainCredentials {
    async fn verify(&self, stored_hash: &str, supplied: &str) -> AppResult<bool> {
        Ok(stored_hash == format!("plain:{supplied}"))
    }
}

/// Accepts and drops every job.
#[derive(Debug, Default)]
pub struct NullScheduler;

#[async_trait]
impl JobScheduler for NullScheduler {
    async fn schedule_at(&self, _: &str, _: Value, _: DateTime<Utc>) -> AppResult<()> {
        Ok(())
    }

    async fn enqueue(&self, _: &str, _: Value) -> AppResult<()> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub ledger: MemoryLedger,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.admin_api_key = ADMIN_KEY.to_string();
        config.session = SessionConfig {
            ttl_seconds: 600,
            max_sessions_per_user: 2,
        };

        let ledger = MemoryLedger::new();
        let cache = Arc::new(MemorySessionCache::default());
        let credentials = Arc::new(PlainCredentials);

        let engine = SessionEngine::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            cache.clone(),
            credentials.clone(),
            Arc::new(JwtCodec::new(&config.auth)),
            Arc::new(NullScheduler),
            config.session.clone(),
        );

        let state = AppState {
            config: Arc::new(config),
            engine,
            accounts: AccountService::new(Arc::new(ledger.clone()), credentials),
            cache,
            database: None,
        };

        Self {
            router: build_router(state),
            ledger,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .header("x-forwarded-for", "192.0.2.10, 10.0.0.1")
                .header("user-agent", "api-test/1.0")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn admin_post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .header("x-admin-token", ADMIN_KEY)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn admin_get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header("x-admin-token", ADMIN_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn with_token(&self, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Sign up and return the new user id.
    pub async fn signup(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/auth/signup",
                serde_json::json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Log in and return `(access_token, session_id)`.
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/auth/login",
                serde_json::json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["session_id"].as_str().unwrap().to_string(),
        )
    }
}
