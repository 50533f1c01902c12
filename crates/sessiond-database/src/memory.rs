//! In-process durable store for single-node development and tests.
//!
//! Implements [`AccountStore`], [`SessionLedger`] and [`LoginAuditLog`]
//! over concurrent maps. Nothing survives a restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use sessiond_core::error::AppError;
use sessiond_core::result::AppResult;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;
use sessiond_entity::audit::{CreateLoginEvent, LoginEvent};
use sessiond_entity::session::{NewSessionRecord, SessionRecord};
use sessiond_entity::user::{CreateUser, User};

use crate::store::{AccountStore, LoginAuditLog, SessionLedger};

/// Memory-backed accounts, session ledger and login audit trail.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    users: Arc<DashMap<UserId, User>>,
    usernames: Arc<DashMap<String, UserId>>,
    sessions: Arc<DashMap<SessionId, SessionRecord>>,
    events: Arc<Mutex<Vec<LoginEvent>>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded login attempt, oldest first.
    pub async fn login_events(&self) -> Vec<LoginEvent> {
        self.events.lock().await.clone()
    }

    /// Number of ledger rows, revoked or not.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl AccountStore for MemoryLedger {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let Some(id) = self.usernames.get(username).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(id).map(|r| r.value().clone()))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: data.username.clone(),
            password_hash: data.password_hash.clone(),
            is_banned: false,
            created_at: now,
            updated_at: now,
        };

        match self.usernames.entry(data.username.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("Username already taken")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn set_banned(&self, id: &UserId, banned: bool) -> AppResult<bool> {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.is_banned = banned;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn banned_user_ids(&self) -> AppResult<Vec<UserId>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.is_banned)
            .map(|u| *u.key())
            .collect())
    }
}

#[async_trait]
impl SessionLedger for MemoryLedger {
    async fn insert(&self, record: &NewSessionRecord) -> AppResult<()> {
        match self.sessions.entry(record.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Session {} already recorded",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(SessionRecord {
                    id: record.id,
                    user_id: record.user_id,
                    created_at: record.created_at,
                    expires_at: record.expires_at,
                    revoked_at: None,
                    revoked_by: None,
                });
                Ok(())
            }
        }
    }

    async fn revoke(&self, id: &SessionId, user_id: &UserId, by: RevokedBy) -> AppResult<bool> {
        match self.sessions.get_mut(id) {
            Some(mut row) if row.revoked_at.is_none() && row.user_id == *user_id => {
                row.revoked_at = Some(Utc::now());
                row.revoked_by = Some(by.as_str().to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<SessionRecord>> {
        Ok(self.sessions.get(id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl LoginAuditLog for MemoryLedger {
    async fn record(&self, event: &CreateLoginEvent) -> AppResult<()> {
        let mut events = self.events.lock().await;
        if events.iter().any(|e| e.id == event.id) {
            return Ok(());
        }
        events.push(LoginEvent {
            id: event.id,
            user_id: event.user_id,
            username: event.username.clone(),
            success: event.success,
            reason: event.reason.clone(),
            ip: event.ip.clone(),
            user_agent: event.user_agent.clone(),
            created_at: event.created_at,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessiond_core::error::ErrorKind;

    fn new_user(name: &str) -> CreateUser {
        CreateUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let ledger = MemoryLedger::new();
        ledger.create(&new_user("alice")).await.unwrap();
        let err = ledger.create(&new_user("alice")).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn revoke_applies_once() {
        let ledger = MemoryLedger::new();
        let user = ledger.create(&new_user("bob")).await.unwrap();
        let now = Utc::now();
        let record = NewSessionRecord {
            id: SessionId::new(),
            user_id: user.id,
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        ledger.insert(&record).await.unwrap();

        // Someone else's id does not touch the row.
        assert!(!ledger.revoke(&record.id, &UserId::new(), RevokedBy::AdminKick).await.unwrap());
        assert!(ledger.revoke(&record.id, &user.id, RevokedBy::User).await.unwrap());
        assert!(!ledger.revoke(&record.id, &user.id, RevokedBy::AdminKick).await.unwrap());
        assert!(!ledger.revoke(&SessionId::new(), &user.id, RevokedBy::User).await.unwrap());

        let row = SessionLedger::find_by_id(&ledger, &record.id).await.unwrap().unwrap();
        assert_eq!(row.revoked_by(), Some(RevokedBy::User));
    }

    #[tokio::test]
    async fn login_event_with_same_id_is_stored_once() {
        let ledger = MemoryLedger::new();
        let event = CreateLoginEvent {
            id: sessiond_core::types::id::LoginEventId::new(),
            user_id: None,
            username: "ghost".to_string(),
            success: false,
            reason: "user_not_found".to_string(),
            ip: "10.0.0.1".to_string(),
            user_agent: "curl/8".to_string(),
            created_at: Utc::now(),
        };

        ledger.record(&event).await.unwrap();
        ledger.record(&event).await.unwrap();

        let events = ledger.login_events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event.id);
        assert_eq!(events[0].created_at, event.created_at);
    }

    #[tokio::test]
    async fn ban_flag_is_listed() {
        let ledger = MemoryLedger::new();
        let carol = ledger.create(&new_user("carol")).await.unwrap();
        ledger.create(&new_user("dave")).await.unwrap();

        assert!(ledger.set_banned(&carol.id, true).await.unwrap());
        assert!(!ledger.set_banned(&UserId::new(), true).await.unwrap());
        assert_eq!(ledger.banned_user_ids().await.unwrap(), vec![carol.id]);
    }
}
