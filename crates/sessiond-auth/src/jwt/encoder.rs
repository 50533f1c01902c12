//! JWT token creation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use sessiond_core::config::AuthConfig;
use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::types::id::{SessionId, UserId};

use super::claims::Claims;

/// Signs HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Sign arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to encode access token", e)
        })
    }

    /// Issue a token bound to `session_id` that expires with the session.
    pub fn issue(
        &self,
        user_id: UserId,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        self.encode(&Claims::for_session(user_id, session_id, expires_at))
    }
}
