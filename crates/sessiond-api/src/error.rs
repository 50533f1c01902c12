//! Maps engine and application errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sessiond_auth::SessionError;
use sessiond_auth::session::InvalidSession;
use sessiond_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Any failure a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Classified engine failure.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Application failure outside the engine.
    #[error(transparent)]
    App(#[from] AppError),
    /// Missing or malformed `Authorization` header.
    #[error("{0}")]
    MissingToken(&'static str),
    /// Admin guard refused the request.
    #[error("Admin token required")]
    Forbidden,
}

impl ApiError {
    /// Request body or path failed validation.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::validation(message))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Session(SessionError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials")
            }
            Self::Session(SessionError::UserBanned) => (StatusCode::FORBIDDEN, "user_banned"),
            Self::Session(SessionError::SessionInvalid(reason)) => {
                (StatusCode::UNAUTHORIZED, reason.code())
            }
            Self::Session(SessionError::Internal(e)) | Self::App(e) => app_status(e),
            Self::MissingToken(_) => (StatusCode::UNAUTHORIZED, InvalidSession::BadToken.code()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        }
    }
}

fn app_status(e: &AppError) -> (StatusCode, &'static str) {
    match e.kind {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation_error"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, InvalidSession::BadToken.code()),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Store details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Session(SessionError::Internal(e)) | Self::App(e) => e.message.clone(),
                other => other.to_string(),
            }
        };

        let body = ApiErrorResponse {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
