//! Bearer token codec trait.

use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::id::{SessionId, UserId};

/// Claims recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Authenticated user.
    pub user_id: UserId,
    /// Session the token is bound to. `None` for unbound tokens.
    pub session_id: Option<SessionId>,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies compact bearer tokens.
pub trait TokenCodec: Send + Sync + 'static {
    /// Issue a token bound to `session_id`, valid until `expires_at`.
    fn issue(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<String>;

    /// Verify signature and expiry. Fails with an authentication error
    /// for anything that is not a currently valid token.
    fn verify(&self, token: &str) -> AppResult<TokenClaims>;
}
