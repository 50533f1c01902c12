//! # sessiond-api
//!
//! Thin HTTP surface over the session engine: signup, login, logout, the
//! caller's own identity, health, and the administrative endpoints.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
