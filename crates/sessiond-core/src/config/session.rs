//! Session lifecycle configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Session lifetime and per-user concurrency cap.
///
/// Held by value inside each engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a session from login, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum live sessions per user. `0` disables the cap.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_user: u32,
}

impl SessionConfig {
    /// Session lifetime as a chrono duration.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds.min(i32::MAX as u64) as i64)
    }

    /// Whether the concurrency cap is enforced.
    pub fn cap_enabled(&self) -> bool {
        self.max_sessions_per_user > 0
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_sessions_per_user: default_max_sessions(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_sessions() -> u32 {
    2
}
