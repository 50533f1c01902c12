//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// HTTP listener and admin guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret expected in the `X-Admin-Token` header.
    /// An empty value disables the admin guard.
    #[serde(default = "default_admin_api_key")]
    pub admin_api_key: String,
}

impl ServerConfig {
    /// Returns `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_api_key: default_admin_api_key(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_admin_api_key() -> String {
    "dev-admin".to_string()
}
