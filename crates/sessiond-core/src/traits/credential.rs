//! Credential hashing and verification traits.

use async_trait::async_trait;

use crate::result::AppResult;

/// Checks a supplied plaintext against a stored credential hash.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Returns `Ok(false)` on mismatch. Errors are reserved for a
    /// malformed hash or a verifier failure.
    async fn verify(&self, stored_hash: &str, supplied: &str) -> AppResult<bool>;
}

/// Produces stored credential hashes at signup.
#[async_trait]
pub trait CredentialHasher: Send + Sync + 'static {
    /// Hash a plaintext credential.
    async fn hash(&self, plaintext: &str) -> AppResult<String>;
}
