//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::result::AppResult;
use sessiond_core::types::id::UserId;
use sessiond_entity::user::{CreateUser, User};

use super::map_write_error;
use crate::store::AccountStore;

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(UserId::new())
        .bind(&data.username)
        .bind(&data.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create user", "Username already taken"))
    }

    async fn set_banned(&self, id: &UserId, banned: bool) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE users SET is_banned = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(banned)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update ban flag", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    async fn banned_user_ids(&self) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE is_banned")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list banned users", e)
            })
    }
}
