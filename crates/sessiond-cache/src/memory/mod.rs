//! In-memory fast session store.

pub mod store;

pub use store::MemorySessionCache;
