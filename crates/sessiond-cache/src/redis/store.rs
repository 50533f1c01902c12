//! Redis implementation of [`SessionCache`].
//!
//! Layout per session:
//! - `sess:{sid}`: hash with `user_id`, `created_at`, `expires_at` (unix
//!   seconds), `ip`, `user_agent`, expiring via `EXPIREAT`
//! - `user_sess:{uid}`: sorted set, member `sid`, score creation time in
//!   unix milliseconds
//! - `banned_user:{uid}`: plain key, value irrelevant, no TTL

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::{debug, warn};

use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::result::AppResult;
use sessiond_core::traits::SessionCache;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::{ClientMeta, LiveSession};

use super::client::RedisClient;
use crate::keys;

const FIELD_USER_ID: &str = "user_id";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_EXPIRES_AT: &str = "expires_at";
const FIELD_IP: &str = "ip";
const FIELD_USER_AGENT: &str = "user_agent";

/// `COUNT` hint per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// Redis-backed fast session store.
#[derive(Debug, Clone)]
pub struct RedisSessionCache {
    client: RedisClient,
}

impl RedisSessionCache {
    /// Wrap a connected client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    fn session_key(&self, session_id: &SessionId) -> String {
        self.client.prefixed_key(&keys::session(session_id))
    }

    fn index_key(&self, user_id: &UserId) -> String {
        self.client.prefixed_key(&keys::user_sessions(user_id))
    }

    fn ban_key(&self, user_id: &UserId) -> String {
        self.client.prefixed_key(&keys::banned_user(user_id))
    }

    fn parse_members(user_id: &UserId, raw: Vec<String>) -> Vec<SessionId> {
        raw.into_iter()
            .filter_map(|m| match m.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(user_id = %user_id, member = %m, "Skipping malformed session index entry");
                    None
                }
            })
            .collect()
    }
}

/// One `SCAN` step over keys matching `pattern`.
fn scan_cmd(cursor: u64, pattern: &str) -> redis::Cmd {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor)
        .arg("MATCH")
        .arg(pattern)
        .arg("COUNT")
        .arg(SCAN_BATCH);
    cmd
}

/// Decode a live record hash. `None` for an empty (absent) hash.
fn decode_record(
    session_id: &SessionId,
    mut fields: HashMap<String, String>,
) -> AppResult<Option<LiveSession>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let corrupt = |what: &str| AppError::session(format!("Live record {session_id} has {what}"));

    let user_id = fields
        .get(FIELD_USER_ID)
        .and_then(|v| v.parse::<UserId>().ok())
        .ok_or_else(|| corrupt("no valid user_id"))?;
    let created_at = fields
        .get(FIELD_CREATED_AT)
        .and_then(|v| parse_unix_seconds(v))
        .ok_or_else(|| corrupt("no valid created_at"))?;
    let expires_at = fields
        .get(FIELD_EXPIRES_AT)
        .and_then(|v| parse_unix_seconds(v))
        .ok_or_else(|| corrupt("no valid expires_at"))?;

    Ok(Some(LiveSession {
        session_id: *session_id,
        user_id,
        created_at,
        expires_at,
        client: ClientMeta {
            ip: fields.remove(FIELD_IP).unwrap_or_default(),
            user_agent: fields.remove(FIELD_USER_AGENT).unwrap_or_default(),
        },
    }))
}

fn parse_unix_seconds(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn create(&self, session: &LiveSession) -> AppResult<()> {
        let key = self.session_key(&session.session_id);
        let index = self.index_key(&session.user_id);
        let member = session.session_id.to_string();
        let fields = [
            (FIELD_USER_ID, session.user_id.to_string()),
            (FIELD_CREATED_AT, session.created_at.timestamp().to_string()),
            (FIELD_EXPIRES_AT, session.expires_at.timestamp().to_string()),
            (FIELD_IP, session.client.ip.clone()),
            (FIELD_USER_AGENT, session.client.user_agent.clone()),
        ];

        let mut conn = self.client.conn();
        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire_at(&key, session.expires_at.timestamp())
            .ignore()
            .zadd(&index, &member, session.created_at.timestamp_millis())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(session_id = %session.session_id, user_id = %session.user_id, "Live session written");
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> AppResult<Option<LiveSession>> {
        let mut conn = self.client.conn();
        let fields: HashMap<String, String> = conn
            .hgetall(self.session_key(session_id))
            .await
            .map_err(Self::map_err)?;
        decode_record(session_id, fields)
    }

    async fn remove(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = redis::pipe()
            .atomic()
            .del(self.session_key(session_id))
            .ignore()
            .zrem(self.index_key(user_id), session_id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn remove_from_index(&self, user_id: &UserId, session_id: &SessionId) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn
            .zrem(self.index_key(user_id), session_id.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn count(&self, user_id: &UserId) -> AppResult<u64> {
        let mut conn = self.client.conn();
        conn.zcard(self.index_key(user_id))
            .await
            .map_err(Self::map_err)
    }

    async fn oldest(&self, user_id: &UserId) -> AppResult<Option<SessionId>> {
        let mut conn = self.client.conn();
        let raw: Vec<String> = conn
            .zrange(self.index_key(user_id), 0, 0)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::parse_members(user_id, raw).into_iter().next())
    }

    async fn members(&self, user_id: &UserId) -> AppResult<Vec<SessionId>> {
        let mut conn = self.client.conn();
        let raw: Vec<String> = conn
            .zrange(self.index_key(user_id), 0, -1)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::parse_members(user_id, raw))
    }

    async fn set_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn
            .set(self.ban_key(user_id), 1)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn clear_ban_marker(&self, user_id: &UserId) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn.del(self.ban_key(user_id)).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn has_ban_marker(&self, user_id: &UserId) -> AppResult<bool> {
        let mut conn = self.client.conn();
        conn.exists(self.ban_key(user_id))
            .await
            .map_err(Self::map_err)
    }

    async fn ban_markers(&self) -> AppResult<Vec<UserId>> {
        let mut conn = self.client.conn();
        let pattern = self.client.prefixed_key(keys::BANNED_USER_PATTERN);
        let mut banned = Vec::new();
        let mut cursor = 0_u64;

        loop {
            let (next, batch): (u64, Vec<String>) = scan_cmd(cursor, &pattern)
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;
            banned.extend(
                batch
                    .iter()
                    .filter_map(|k| keys::parse_banned_user(self.client.unprefixed(k))),
            );
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        banned.sort_unstable();
        banned.dedup();
        Ok(banned)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
