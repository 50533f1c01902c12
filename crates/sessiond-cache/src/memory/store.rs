//! In-memory [`SessionCache`] for single-node deployments and tests.
//!
//! Live records sit in a moka cache that expires each entry at its own
//! `expires_at`. The per-user index and the ban markers are plain concurrent
//! maps. When moka evicts an expired record its index entry goes with it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use moka::Expiry;
use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::debug;

use sessiond_core::result::AppResult;
use sessiond_core::traits::SessionCache;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::LiveSession;

/// Index entry ordered by creation time, then id.
type IndexEntry = (i64, SessionId);

type Indexes = DashMap<UserId, BTreeSet<IndexEntry>>;

/// Expires each live record at its `expires_at`.
struct UntilExpiresAt;

impl UntilExpiresAt {
    fn remaining(session: &LiveSession) -> Duration {
        (session.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl Expiry<SessionId, LiveSession> for UntilExpiresAt {
    fn expire_after_create(
        &self,
        _key: &SessionId,
        value: &LiveSession,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }

    fn expire_after_update(
        &self,
        _key: &SessionId,
        value: &LiveSession,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }
}

fn drop_from_index(indexes: &Indexes, user_id: &UserId, session_id: &SessionId) {
    if let Some(mut index) = indexes.get_mut(user_id) {
        index.retain(|(_, sid)| sid != session_id);
    }
    indexes.remove_if(user_id, |_, index| index.is_empty());
}

/// Memory-backed fast session store.
#[derive(Debug, Clone)]
pub struct MemorySessionCache {
    records: Cache<SessionId, LiveSession>,
    indexes: Arc<Indexes>,
    ban_markers: Arc<DashSet<UserId>>,
}

impl Default for MemorySessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionCache {
    /// Create an empty store.
    pub fn new() -> Self {
        let indexes: Arc<Indexes> = Arc::new(DashMap::new());
        let on_evict = Arc::clone(&indexes);

        let records = Cache::builder()
            .expire_after(UntilExpiresAt)
            .eviction_listener(move |sid: Arc<SessionId>, live: LiveSession, cause| {
                if cause == RemovalCause::Expired {
                    drop_from_index(&on_evict, &live.user_id, &sid);
                    debug!(session_id = %sid, user_id = %live.user_id, "Expired live session evicted");
                }
            })
            .build();

        Self {
            records,
            indexes,
            ban_markers: Arc::new(DashSet::new()),
        }
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn create(&self, session: &LiveSession) -> AppResult<()> {
        // Index first: an already-expired record may be evicted inside insert.
        self.indexes
            .entry(session.user_id)
            .or_default()
            .insert((session.created_at.timestamp_millis(), session.session_id));
        self.records
            .insert(session.session_id, session.clone())
            .await;
        debug!(session_id = %session.session_id, user_id = %session.user_id, "Live session written");
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> AppResult<Option<LiveSession>> {
        Ok(self.records.get(session_id).await)
    }

    async fn remove(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        self.records.invalidate(session_id).await;
        drop_from_index(&self.indexes, user_id, session_id);
        Ok(())
    }

    async fn remove_from_index(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        drop_from_index(&self.indexes, user_id, session_id);
        Ok(())
    }

    async fn count(&self, user_id: &UserId) -> AppResult<u64> {
        Ok(self.indexes.get(user_id).map_or(0, |i| i.len() as u64))
    }

    async fn oldest(&self, user_id: &UserId) -> AppResult<Option<SessionId>> {
        Ok(self
            .indexes
            .get(user_id)
            .and_then(|i| i.first().map(|(_, sid)| *sid)))
    }

    async fn members(&self, user_id: &UserId) -> AppResult<Vec<SessionId>> {
        Ok(self
            .indexes
            .get(user_id)
            .map(|i| i.iter().map(|(_, sid)| *sid).collect())
            .unwrap_or_default())
    }

    async fn set_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.ban_markers.insert(*user_id);
        Ok(())
    }

    async fn clear_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        self.ban_markers.remove(user_id);
        Ok(())
    }

    async fn has_ban_marker(&self, user_id: &UserId) -> AppResult<bool> {
        Ok(self.ban_markers.contains(user_id))
    }

    async fn ban_markers(&self) -> AppResult<Vec<UserId>> {
        Ok(self.ban_markers.iter().map(|u| *u.key()).collect())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
