//! Fast session store configuration.

use serde::{Deserialize, Serialize};

/// Top-level fast store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis backend settings.
    #[serde(default)]
    pub redis: RedisCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCacheConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix prepended to every key. Empty by default so operational
    /// tooling sees the bare `sess:`, `user_sess:` and `banned_user:` keys.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: String::new(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
