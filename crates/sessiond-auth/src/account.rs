//! Account registration.

use std::sync::Arc;

use tracing::info;

use sessiond_core::error::AppError;
use sessiond_core::result::AppResult;
use sessiond_core::traits::CredentialHasher;
use sessiond_core::types::id::UserId;
use sessiond_database::AccountStore;
use sessiond_entity::user::{CreateUser, User};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Creates user accounts.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { accounts, hasher }
    }

    /// Register a new user. The username is stored as given after trimming.
    ///
    /// Fails with a validation error for an empty username or password and
    /// with a conflict error when the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .accounts
            .create(&CreateUser {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Look up a user by id.
    pub async fn get(&self, user_id: &UserId) -> AppResult<User> {
        self.accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }
}
