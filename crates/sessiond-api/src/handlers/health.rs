//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{ComponentStatus, HealthResponse};
use crate::state::AppState;

fn probe(result: Result<bool, sessiond_core::error::AppError>, component: &str) -> ComponentStatus {
    match result {
        Ok(true) => ComponentStatus::Up,
        Ok(false) => ComponentStatus::Down,
        Err(e) => {
            tracing::warn!(component, error = %e, "Health probe failed");
            ComponentStatus::Down
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = probe(state.cache.health_check().await, "cache");
    let database = match &state.database {
        Some(pool) => probe(pool.health_check().await, "database"),
        None => ComponentStatus::Skipped,
    };

    let healthy = cache != ComponentStatus::Down && database != ComponentStatus::Down;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache,
            database,
        }),
    )
}
