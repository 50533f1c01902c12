//! # sessiond-database
//!
//! PostgreSQL connection management, migrations, and the durable side of
//! the session lifecycle: accounts, the session ledger, the login audit
//! trail, and the job table backing the worker queue.
//!
//! The traits in [`store`] are what the session engine is wired against.
//! The PostgreSQL repositories implement them, and with the `memory`
//! feature so does [`memory::MemoryLedger`].

pub mod connection;
#[cfg(feature = "memory")]
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{AccountStore, LoginAuditLog, SessionLedger};
