//! Token signing configuration.

use serde::{Deserialize, Serialize};

/// Bearer token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Allowed clock skew when validating `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub jwt_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "dev-secret-change-me".to_string()
}

fn default_leeway() -> u64 {
    5
}
