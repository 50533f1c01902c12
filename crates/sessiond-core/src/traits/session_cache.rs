//! Fast session store trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{SessionId, UserId};
use crate::types::session::LiveSession;

/// TTL-capable store holding live session records, the per-user session
/// index and ban markers.
///
/// Implementations hold no business logic. Two are provided:
/// - Redis-based (hash + sorted set + plain key, grouped in `MULTI`)
/// - In-memory (moka cache with per-entry expiry)
#[async_trait]
pub trait SessionCache: Send + Sync + 'static {
    /// Atomically write the live record (expiring at `session.expires_at`)
    /// and add it to the owner's index scored by creation time.
    async fn create(&self, session: &LiveSession) -> AppResult<()>;

    /// Read a live record. `None` when absent or already expired.
    async fn get(&self, session_id: &SessionId) -> AppResult<Option<LiveSession>>;

    /// Atomically delete the live record and its index entry.
    /// Removing something that is not there is not an error.
    async fn remove(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()>;

    /// Drop one entry from the user's index, leaving any live record in
    /// place.
    async fn remove_from_index(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()>;

    /// Number of entries in the user's index.
    async fn count(&self, user_id: &UserId) -> AppResult<u64>;

    /// The index entry with the lowest creation-time score.
    async fn oldest(&self, user_id: &UserId) -> AppResult<Option<SessionId>>;

    /// Every index entry for the user, oldest first.
    async fn members(&self, user_id: &UserId) -> AppResult<Vec<SessionId>>;

    /// Set the presence-only ban marker (no expiry).
    async fn set_ban_marker(&self, user_id: &UserId) -> AppResult<()>;

    /// Delete the ban marker.
    async fn clear_ban_marker(&self, user_id: &UserId) -> AppResult<()>;

    /// Whether the ban marker exists.
    async fn has_ban_marker(&self, user_id: &UserId) -> AppResult<bool>;

    /// Every user currently carrying a ban marker.
    async fn ban_markers(&self) -> AppResult<Vec<UserId>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
