//! Session cache manager that dispatches to the configured backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use sessiond_core::config::CacheConfig;
use sessiond_core::error::AppError;
use sessiond_core::result::AppResult;
use sessiond_core::traits::SessionCache;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::LiveSession;

/// Wraps the fast session store selected by configuration.
#[derive(Clone)]
pub struct SessionCacheManager {
    inner: Arc<dyn SessionCache>,
}

impl fmt::Debug for SessionCacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCacheManager").finish_non_exhaustive()
    }
}

impl SessionCacheManager {
    /// Build the backend named by `config.provider`.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn SessionCache> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis session store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisSessionCache::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory session store");
                Arc::new(crate::memory::MemorySessionCache::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Wrap an existing store (used by tests and embedders).
    pub fn from_store(store: Arc<dyn SessionCache>) -> Self {
        Self { inner: store }
    }
}

#[async_trait]
impl SessionCache for SessionCacheManager {
    async fn create(&self, session: &LiveSession) -> AppResult<()> {
        self.inner.create(session).await
    }

    async fn get(&self, session_id: &SessionId) -> AppResult<Option<LiveSession>> {
        self.inner.get(session_id).await
    }

    async fn remove(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        self.inner.remove(user_id, session_id).await
    }

    async fn remove_from_index(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        self.inner.remove_from_index(user_id, session_id).await
    }

    async fn count(&self, user_id: &UserId) -> AppResult<u64> {
        self.inner.count(user_id).await
    }

    async fn oldest(&self, user_id: &UserId) -> AppResult<Option<SessionId>> {
        self.inner.oldest(user_id).await
    }

    async fn members(&self, user_id: &UserId) -> AppResult<Vec<SessionId>> {
        self.inner.members(user_id).await
    }

    async fn set_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.inner.set_ban_marker(user_id).await
    }

    async fn clear_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.inner.clear_ban_marker(user_id).await
    }

    async fn has_ban_marker(&self, user_id: &UserId) -> AppResult<bool> {
        self.inner.has_ban_marker(user_id).await
    }

    async fn ban_markers(&self) -> AppResult<Vec<UserId>> {
        self.inner.ban_markers().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessiond_core::error::ErrorKind;

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let config = CacheConfig {
            provider: "memcached".to_string(),
            ..CacheConfig::default()
        };
        let err = SessionCacheManager::new(&config).await.unwrap_err();
        assert!(err.is(ErrorKind::Configuration));
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn memory_provider_is_healthy() {
        let config = CacheConfig {
            provider: "memory".to_string(),
            ..CacheConfig::default()
        };
        let manager = SessionCacheManager::new(&config).await.unwrap();
        assert!(manager.health_check().await.unwrap());
    }
}
