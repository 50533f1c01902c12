//! # sessiond-entity
//!
//! Durable-store models for sessiond. Every struct here is either a table
//! row (deriving `sqlx::FromRow`) or the insert shape for one, plus the
//! typed payloads carried by background jobs.

pub mod audit;
pub mod job;
pub mod session;
pub mod user;
