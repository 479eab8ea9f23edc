//! Store settings with a short-lived in-memory cache.

use moka::future::Cache;
use tracing::{debug, instrument};

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::StoreSettings;
use crate::state::AppState;

const CACHE_KEY: &str = "store";

/// Reads and writes store-wide settings.
pub struct SettingsService<'a> {
    repo: SettingsRepository<'a>,
    cache: &'a Cache<&'static str, StoreSettings>,
}

impl<'a> SettingsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            repo: SettingsRepository::new(state.pool()),
            cache: state.settings_cache(),
        }
    }

    /// Current settings, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings table cannot be read.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<StoreSettings, RepositoryError> {
        if let Some(settings) = self.cache.get(CACHE_KEY).await {
            return Ok(settings);
        }

        let settings = self.repo.load().await?;
        debug!("Loaded store settings from database");
        self.cache.insert(CACHE_KEY, settings.clone()).await;
        Ok(settings)
    }

    /// Persist settings and refresh the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self, settings))]
    pub async fn save(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        self.repo.save(settings).await?;
        self.cache.insert(CACHE_KEY, settings.clone()).await;
        Ok(())
    }
}
