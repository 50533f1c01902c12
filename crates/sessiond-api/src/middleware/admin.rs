//! Shared-secret guard for the admin endpoints.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the admin API key.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Whether `supplied` matches `expected`. An empty `expected` disables
/// the guard.
pub fn admin_key_matches(expected: &str, supplied: Option<&str>) -> bool {
    if expected.is_empty() {
        return true;
    }
    let Some(supplied) = supplied else {
        return false;
    };
    // Length is not secret; compare the bytes without early exit.
    expected.len() == supplied.len()
        && expected
            .bytes()
            .zip(supplied.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Rejects the request with 403 unless `X-Admin-Token` carries the key.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let supplied = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if !admin_key_matches(&state.config.server.admin_api_key, supplied) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
