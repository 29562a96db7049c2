//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use nearby_core::AdminAllowList;

use crate::config::SiteConfig;
use crate::places::PlacesClient;
use crate::services::GoogleOAuthClient;
use crate::storage::StorageClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds no locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    places: PlacesClient,
    storage: StorageClient,
    oauth: GoogleOAuthClient,
}

impl AppState {
    /// Create the application state, building the outbound clients from config.
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool) -> Self {
        let oauth = GoogleOAuthClient::new(&config.google);
        Self::with_oauth(config, pool, oauth)
    }

    /// Create the application state with a prebuilt sign-in client.
    #[must_use]
    pub fn with_oauth(config: SiteConfig, pool: PgPool, oauth: GoogleOAuthClient) -> Self {
        let places = PlacesClient::new(config.google.places_api_key.clone());
        let storage = StorageClient::new(config.storage.as_ref());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                places,
                storage,
                oauth,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Places API client.
    #[must_use]
    pub fn places(&self) -> &PlacesClient {
        &self.inner.places
    }

    /// Get a reference to the image storage client.
    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    /// Get a reference to the Google OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &GoogleOAuthClient {
        &self.inner.oauth
    }

    /// The admin allow-list loaded at startup.
    #[must_use]
    pub fn admins(&self) -> &AdminAllowList {
        &self.inner.config.admins
    }
}
