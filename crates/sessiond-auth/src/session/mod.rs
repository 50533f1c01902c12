//! The session lifecycle engine.
//!
//! [`SessionEngine`] owns every write to live records, the per-user index
//! and ban markers. Its operations are split across submodules:
//!
//! - `login`: credential checks, cap enforcement, session issue
//! - `engine`: construction, validity, logout, the authenticated-request
//!   boundary
//! - `admin`: listing, kick, ban, unban
//! - `reconcile`: handlers run by the background worker

pub mod admin;
pub mod engine;
pub mod error;
pub mod login;
pub mod outcome;
pub mod reconcile;

pub use engine::SessionEngine;
pub use error::{InvalidSession, SessionError};
pub use outcome::{
    ActiveSession, BanReconcileReport, BestEffortStep, DegradedStep, ExpireOutcome,
    KickAllOutcome, LoginOutcome, Principal, RevokeOutcome,
};
