//! Admin session handlers: list, kick, ban, unban.

use axum::Json;
use axum::extract::{Path, State};

use sessiond_auth::session::KickAllOutcome;
use sessiond_core::types::id::UserId;

use crate::dto::request::{KickRequest, KickTarget};
use crate::dto::response::{KickResponse, MessageResponse, SessionListResponse};
use crate::error::ApiError;
use crate::state::AppState;

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid user id '{raw}'")))
}

impl From<KickAllOutcome> for KickResponse {
    fn from(outcome: KickAllOutcome) -> Self {
        Self {
            kicked: outcome.kicked,
            failed: outcome.failures.into_iter().map(|(sid, _)| sid).collect(),
        }
    }
}

/// GET /admin/users/{id}/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let sessions = state.engine.list_active_sessions(&user_id).await?;
    Ok(Json(SessionListResponse { user_id, sessions }))
}

/// POST /admin/users/{id}/kick
pub async fn kick(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<KickRequest>,
) -> Result<Json<KickResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let target = req
        .target()
        .ok_or_else(|| ApiError::validation("Provide either session_id or all=true"))?;

    let response = match target {
        KickTarget::One(session_id) => {
            let outcome = state.engine.kick_session(&user_id, &session_id).await?;
            KickResponse {
                kicked: vec![outcome.session_id],
                failed: Vec::new(),
            }
        }
        KickTarget::All => state.engine.kick_all_sessions(&user_id).await?.into(),
    };
    Ok(Json(response))
}

/// POST /admin/users/{id}/ban
pub async fn ban(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<KickResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let outcome = state.engine.ban_user(&user_id).await?;
    Ok(Json(outcome.into()))
}

/// POST /admin/users/{id}/unban
pub async fn unban(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.engine.unban_user(&user_id).await?;
    Ok(Json(MessageResponse::new("User unbanned")))
}
