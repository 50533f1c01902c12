//! Login audit fact model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sessiond_core::types::id::{LoginEventId, UserId};

/// An immutable record of one login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginEvent {
    /// Row identifier.
    pub id: LoginEventId,
    /// Resolved user, `None` when the username did not resolve.
    pub user_id: Option<UserId>,
    /// Username as supplied.
    pub username: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Outcome reason code.
    pub reason: String,
    /// Client origin address.
    pub ip: String,
    /// Client agent string.
    pub user_agent: String,
    /// When the fact was recorded.
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a login audit fact.
///
/// The id is chosen by the producer, so writing the same fact twice
/// stores it once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoginEvent {
    /// Fact identifier.
    pub id: LoginEventId,
    /// Resolved user.
    pub user_id: Option<UserId>,
    /// Username as supplied.
    pub username: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Outcome reason code.
    pub reason: String,
    /// Client origin address.
    pub ip: String,
    /// Client agent string.
    pub user_agent: String,
    /// When the attempt happened.
    pub created_at: DateTime<Utc>,
}
