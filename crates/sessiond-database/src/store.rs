//! Durable-store traits consumed by the session engine and the worker.

use async_trait::async_trait;

use sessiond_core::result::AppResult;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;
use sessiond_entity::audit::CreateLoginEvent;
use sessiond_entity::session::{NewSessionRecord, SessionRecord};
use sessiond_entity::user::{CreateUser, User};

/// User accounts and the authoritative ban flag.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// Create a user. Fails with a conflict error if the username is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Set or clear the ban flag. Returns `false` if the user does not exist.
    async fn set_banned(&self, id: &UserId, banned: bool) -> AppResult<bool>;

    /// Ids of every user whose ban flag is set.
    async fn banned_user_ids(&self) -> AppResult<Vec<UserId>>;
}

/// Durable, audit-only record of issued sessions.
#[async_trait]
pub trait SessionLedger: Send + Sync + 'static {
    /// Insert the ledger row for a newly issued session.
    async fn insert(&self, record: &NewSessionRecord) -> AppResult<()>;

    /// Mark `user_id`'s row revoked. Rows already revoked, missing, or owned
    /// by someone else are left alone and reported as `false`; that is not
    /// an error.
    async fn revoke(&self, id: &SessionId, user_id: &UserId, by: RevokedBy) -> AppResult<bool>;

    /// Fetch a ledger row.
    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<SessionRecord>>;
}

/// Append-only login audit trail.
#[async_trait]
pub trait LoginAuditLog: Send + Sync + 'static {
    /// Append one audit fact.
    async fn record(&self, event: &CreateLoginEvent) -> AppResult<()>;
}
