//! # sessiond-core
//!
//! Core crate for sessiond. Contains the configuration schema, typed
//! identifiers, live-session value types, the unified error system, and
//! the collaborator traits the session engine is wired against.
//!
//! This crate has **no** internal dependencies on other sessiond crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
