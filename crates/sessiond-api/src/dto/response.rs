//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessiond_auth::session::ActiveSession;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_entity::user::User;

/// Public view of a user. Never carries the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User id.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Whether the user is banned.
    pub is_banned: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_banned: user.is_banned,
            created_at: user.created_at,
        }
    }
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Seconds until the session expires.
    pub expires_in: i64,
    /// The new session.
    pub session_id: SessionId,
}

/// The caller's own identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// The user.
    #[serde(flatten)]
    pub user: UserResponse,
    /// Session the request ran under.
    pub session_id: SessionId,
}

/// Sessions of one user.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    /// Owner.
    pub user_id: UserId,
    /// Live sessions, oldest first.
    pub sessions: Vec<ActiveSession>,
}

/// Result of a kick or ban.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickResponse {
    /// Sessions terminated.
    pub kicked: Vec<SessionId>,
    /// Sessions that could not be terminated.
    pub failed: Vec<SessionId>,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Build a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// State of one dependency in `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Reachable.
    Up,
    /// Probe failed.
    Down,
    /// Not configured in this process.
    Skipped,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Fast store.
    pub cache: ComponentStatus,
    /// Durable store.
    pub database: ComponentStatus,
}
