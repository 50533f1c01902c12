//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sessiond_auth::{AccountService, SessionEngine};
use sessiond_core::config::AppConfig;
use sessiond_core::traits::SessionCache;
use sessiond_database::DatabasePool;

/// Everything a handler needs. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Session lifecycle engine
    pub engine: SessionEngine,
    /// Account registration
    pub accounts: AccountService,
    /// Fast session store, probed by `/health`
    pub cache: Arc<dyn SessionCache>,
    /// Durable store pool, probed by `/health`. Absent when the ledger is
    /// not PostgreSQL-backed.
    pub database: Option<DatabasePool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("database", &self.database.is_some())
            .finish_non_exhaustive()
    }
}
