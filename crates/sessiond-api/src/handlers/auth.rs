//! Auth handlers: signup, login, logout, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use validator::Validate;

use crate::dto::request::{LoginRequest, SignupRequest};
use crate::dto::response::{LoginResponse, MeResponse, MessageResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientInfo};
use crate::state::AppState;

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let user = state.accounts.register(&req.username, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state
        .engine
        .login(&req.username, &req.password, client)
        .await?;

    let expires_in = (outcome.expires_at - Utc::now()).num_seconds().max(0);
    Ok(Json(LoginResponse {
        access_token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in,
        session_id: outcome.session_id,
    }))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.logout(&auth.user_id, &auth.session_id).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.accounts.get(&auth.user_id).await?;
    Ok(Json(MeResponse {
        user: user.into(),
        session_id: auth.session_id,
    }))
}
