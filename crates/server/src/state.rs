//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::PgCatalog;
use crate::config::ServerConfig;
use crate::ingest::Ingestor;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the connection pool,
/// configuration, and the ingestion orchestrator.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    ingestor: Ingestor<PgCatalog>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed fetcher's HTTP client fails to build.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let ingestor = Ingestor::new(&config.ingest, PgCatalog::new(pool.clone()))?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                ingestor,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the ingestion orchestrator.
    #[must_use]
    pub fn ingestor(&self) -> &Ingestor<PgCatalog> {
        &self.inner.ingestor
    }
}
