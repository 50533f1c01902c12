//! Login audit entities.

pub mod model;
pub mod reason;

pub use model::{CreateLoginEvent, LoginEvent};
pub use reason::LoginReason;
