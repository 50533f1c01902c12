//! Core type definitions used across the sessiond workspace.

pub mod id;
pub mod session;

pub use id::*;
pub use session::{ClientMeta, LiveSession, RevokedBy};
