//! # sessiond-auth
//!
//! Authentication and the session lifecycle engine.
//!
//! ## Modules
//!
//! - `jwt`: HS256 bearer tokens bound to a session
//! - `password`: Argon2id credential hashing and verification
//! - `account`: account registration
//! - `session`: the session engine (login, logout, validity, kick, ban)
//!   and the reconciliation operations run by the worker

pub mod account;
pub mod jwt;
pub mod password;
pub mod session;

pub use account::AccountService;
pub use jwt::{Claims, JwtCodec};
pub use password::PasswordHasher;
pub use session::{LoginOutcome, SessionEngine, SessionError};
