//! [`TokenCodec`] implementation over the JWT encoder and decoder.

use chrono::{DateTime, Utc};

use sessiond_core::config::AuthConfig;
use sessiond_core::result::AppResult;
use sessiond_core::traits::{TokenClaims, TokenCodec};
use sessiond_core::types::id::{SessionId, UserId};

use super::decoder::JwtDecoder;
use super::encoder::JwtEncoder;

/// HS256 token codec used by the session engine.
#[derive(Debug, Clone)]
pub struct JwtCodec {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl JwtCodec {
    /// Build encoder and decoder from the same secret.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
        }
    }

    /// The underlying encoder, for callers that mint custom claims.
    pub fn encoder(&self) -> &JwtEncoder {
        &self.encoder
    }
}

impl TokenCodec for JwtCodec {
    fn issue(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<String> {
        self.encoder.issue(*user_id, *session_id, expires_at)
    }

    fn verify(&self, token: &str) -> AppResult<TokenClaims> {
        let claims = self.decoder.decode(token)?;
        Ok(TokenClaims {
            user_id: claims.sub,
            session_id: claims.sid,
            expires_at: claims.expires_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sessiond_core::error::ErrorKind;
    use uuid::Uuid;

    use crate::jwt::Claims;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_leeway_seconds: 0,
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let codec = JwtCodec::new(&config("s3cret"));
        let uid = UserId::new();
        let sid = SessionId::new();
        let exp = Utc::now() + Duration::minutes(5);

        let token = codec.issue(&uid, &sid, exp).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.user_id, uid);
        assert_eq!(claims.session_id, Some(sid));
        assert_eq!(claims.expires_at.timestamp(), exp.timestamp());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtCodec::new(&config("one"))
            .issue(&UserId::new(), &SessionId::new(), Utc::now() + Duration::minutes(5))
            .unwrap();
        let err = JwtCodec::new(&config("two")).verify(&token).unwrap_err();
        assert!(err.is(ErrorKind::Authentication));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = JwtCodec::new(&config("s3cret"));
        let token = codec
            .issue(&UserId::new(), &SessionId::new(), Utc::now() - Duration::minutes(5))
            .unwrap();
        let err = codec.verify(&token).unwrap_err();
        assert!(err.is(ErrorKind::Authentication));
    }

    #[test]
    fn unbound_token_verifies_without_session() {
        let codec = JwtCodec::new(&config("s3cret"));
        let now = Utc::now();
        let claims = Claims {
            sub: UserId::new(),
            sid: None,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(5)).timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = codec.encoder().encode(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap().session_id, None);
    }
}
