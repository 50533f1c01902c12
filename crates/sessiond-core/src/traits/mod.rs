//! Collaborator traits defined in `sessiond-core` and implemented by
//! the store, auth and worker crates.

pub mod credential;
pub mod job_scheduler;
pub mod session_cache;
pub mod token;

pub use credential::{CredentialHasher, CredentialVerifier};
pub use job_scheduler::JobScheduler;
pub use session_cache::SessionCache;
pub use token::{TokenClaims, TokenCodec};
