//! # sessiond-cache
//!
//! Fast session store implementations. Two backends:
//!
//! - **redis**: hashes, sorted sets and plain keys on a Redis instance,
//!   with related writes grouped into one `MULTI`/`EXEC`
//! - **memory**: single-process store on moka, records expire on their own
//!
//! The backend is selected at runtime from configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::SessionCacheManager;
