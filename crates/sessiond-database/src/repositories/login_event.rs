//! Login audit repository.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::result::AppResult;
use sessiond_entity::audit::CreateLoginEvent;

use crate::store::LoginAuditLog;

/// Repository for the append-only `login_events` table.
#[derive(Debug, Clone)]
pub struct LoginEventRepository {
    pool: PgPool,
}

impl LoginEventRepository {
    /// Create a new login event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAuditLog for LoginEventRepository {
    async fn record(&self, event: &CreateLoginEvent) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO login_events \
             (id, user_id, username, success, reason, ip, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.username)
        .bind(event.success)
        .bind(&event.reason)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login event", e)
        })?;

        if result.rows_affected() == 0 {
            debug!(event_id = %event.id, "Login event already recorded");
        }
        Ok(())
    }
}
