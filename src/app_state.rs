//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::{StoreBackend, TrackerConfig};
use crate::persistence::{MemoryStore, PostgresStore, StoreError};
use crate::service::{ActivityTracker, RateLimiter};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-tracking service.
    pub tracker: Arc<ActivityTracker>,
    /// Per-client limiter for watcher routes, `None` when disabled.
    pub rate_limiter: Option<RateLimiter>,
    /// Backend reported by the health endpoint.
    pub store_backend: StoreBackend,
}

impl AppState {
    /// Builds state over the backend selected in `config`.
    ///
    /// For PostgreSQL this opens the pool and, unless disabled, applies
    /// the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be reached or
    /// migrated.
    pub async fn from_config(config: &TrackerConfig) -> Result<Self, StoreError> {
        let tracker = match config.store_backend {
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                ActivityTracker::new(Arc::<MemoryStore>::clone(&store), store, config.paging)
            }
            StoreBackend::Postgres => {
                let store = Arc::new(PostgresStore::connect(&config.database).await?);
                if config.database.run_migrations {
                    store.migrate().await?;
                    tracing::info!("database migrations applied");
                }
                ActivityTracker::new(Arc::<PostgresStore>::clone(&store), store, config.paging)
            }
        };

        Ok(Self {
            tracker: Arc::new(tracker),
            rate_limiter: RateLimiter::from_config(&config.rate_limit),
            store_backend: config.store_backend,
        })
    }

    /// Builds state over an existing in-memory store.
    ///
    /// The caller keeps its handle to `store`, which lets it act as the
    /// ingestion side.
    #[must_use]
    pub fn with_memory_store(store: Arc<MemoryStore>, config: &TrackerConfig) -> Self {
        let tracker = ActivityTracker::new(Arc::<MemoryStore>::clone(&store), store, config.paging);
        Self {
            tracker: Arc::new(tracker),
            rate_limiter: RateLimiter::from_config(&config.rate_limit),
            store_backend: StoreBackend::Memory,
        }
    }
}
