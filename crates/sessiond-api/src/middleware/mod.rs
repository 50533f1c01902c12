//! HTTP middleware.

pub mod admin;
pub mod logging;
