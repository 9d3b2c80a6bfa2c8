//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Store,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Opened store client
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Store) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store client.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }
}
