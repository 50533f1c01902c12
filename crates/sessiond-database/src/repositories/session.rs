//! Session ledger repository.

use async_trait::async_trait;
use sqlx::PgPool;

use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::result::AppResult;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;
use sessiond_entity::session::{NewSessionRecord, SessionRecord};

use crate::store::SessionLedger;

/// Repository for the `sessions` ledger table.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionLedger for SessionRepository {
    async fn insert(&self, record: &NewSessionRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert session", e))?;
        Ok(())
    }

    async fn revoke(&self, id: &SessionId, user_id: &UserId, by: RevokedBy) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW(), revoked_by = $3 \
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .bind(by.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }
}
