//! Settings repository.
//!
//! Settings are free-form key/value pairs with JSONB values. Typed access
//! goes through [`StoreSettings`].

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::StoreSettings;

/// Repository for store settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every stored key/value pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_all(&self) -> Result<HashMap<String, JsonValue>, RepositoryError> {
        let rows: Vec<(String, JsonValue)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Typed settings with defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(&self) -> Result<StoreSettings, RepositoryError> {
        Ok(StoreSettings::from_values(&self.get_all().await?))
    }

    /// Set a single value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Write every typed setting in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails.
    pub async fn save(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in settings.to_values() {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES ($1, $2) \
                 ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
            )
            .bind(key)
            .bind(&value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
