//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::models::StoreSettings;
use crate::printful::{PrintfulClient, PrintfulError};
use crate::stripe::{StripeClient, StripeError};

/// How long settings are served from memory.
const SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("stripe client: {0}")]
    Stripe(#[from] StripeError),
    #[error("printful client: {0}")]
    Printful(#[from] PrintfulError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, API clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    stripe: StripeClient,
    printful: Option<PrintfulClient>,
    settings_cache: Cache<&'static str, StoreSettings>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if an API client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let stripe = StripeClient::new(&config.stripe)?;
        let printful = config
            .printful
            .as_ref()
            .map(PrintfulClient::new)
            .transpose()?;

        if printful.is_none() {
            tracing::warn!("PRINTFUL_API_TOKEN not set, fulfillment and catalog sync are disabled");
        }

        Ok(Self::from_parts(config, pool, stripe, printful))
    }

    /// Assemble state from already-built clients.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        pool: PgPool,
        stripe: StripeClient,
        printful: Option<PrintfulClient>,
    ) -> Self {
        let settings_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(SETTINGS_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stripe,
                printful,
                settings_cache,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Stripe client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get the Printful client, if configured.
    #[must_use]
    pub fn printful(&self) -> Option<&PrintfulClient> {
        self.inner.printful.as_ref()
    }

    /// Get the settings cache.
    #[must_use]
    pub fn settings_cache(&self) -> &Cache<&'static str, StoreSettings> {
        &self.inner.settings_cache
    }
}
