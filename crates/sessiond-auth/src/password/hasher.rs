//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use async_trait::async_trait;

use sessiond_core::error::AppError;
use sessiond_core::result::AppResult;
use sessiond_core::traits::{CredentialHasher, CredentialVerifier};

/// Argon2id credential hasher and verifier.
///
/// Hashing is CPU-bound, so the async trait methods run it on the
/// blocking pool.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[async_trait]
impl CredentialVerifier for PasswordHasher {
    async fn verify(&self, stored_hash: &str, supplied: &str) -> AppResult<bool> {
        let hasher = self.clone();
        let stored_hash = stored_hash.to_string();
        let supplied = supplied.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&supplied, &stored_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
    }
}

#[async_trait]
impl CredentialHasher for PasswordHasher {
    async fn hash(&self, plaintext: &str) -> AppResult<String> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_password(&plaintext))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new();
        let hash = CredentialHasher::hash(&hasher, "correct horse").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "correct horse").await.unwrap());
        assert!(!hasher.verify(&hash, "battery staple").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let hasher = PasswordHasher::new();
        assert!(hasher.verify("not-a-hash", "x").await.is_err());
    }
}
