//! Client origin and agent for login auditing.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use sessiond_core::types::session::ClientMeta;

/// Client metadata taken from proxy and agent headers.
#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientMeta);

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        // First hop of X-Forwarded-For is the original client.
        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| header("x-real-ip"))
            .unwrap_or("unknown")
            .to_string();

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(ClientInfo(ClientMeta::new(ip, user_agent)))
    }
}
