//! Maintenance jobs meant to run from cron.
//!
//! ```bash
//! inkdrop prune-carts
//! inkdrop sync-products
//! inkdrop analytics rollup [--date YYYY-MM-DD]
//! ```

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;

use inkdrop_storefront::config::{ConfigError, PrintfulConfig};
use inkdrop_storefront::db::{CartRepository, RepositoryError};
use inkdrop_storefront::printful::{PrintfulClient, PrintfulError};
use inkdrop_storefront::services::analytics::{AnalyticsService, yesterday};
use inkdrop_storefront::services::catalog_sync::CatalogSync;

/// Errors from maintenance jobs.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("PRINTFUL_API_TOKEN is not set")]
    PrintfulNotConfigured,

    #[error(transparent)]
    Printful(#[from] PrintfulError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete carts whose expiry has passed.
///
/// # Errors
///
/// Returns `MaintenanceError::Repository` if the delete fails.
pub async fn prune_carts(pool: &PgPool) -> Result<u64, MaintenanceError> {
    let removed = CartRepository::new(pool).prune_expired().await?;
    tracing::info!("Pruned {} expired carts", removed);
    Ok(removed)
}

/// Import new Printful products and refresh existing ones.
///
/// # Errors
///
/// Returns `MaintenanceError` if Printful is not configured or cannot be
/// reached.
pub async fn sync_products(pool: &PgPool) -> Result<(), MaintenanceError> {
    let config = PrintfulConfig::from_env()?.ok_or(MaintenanceError::PrintfulNotConfigured)?;
    let client = PrintfulClient::new(&config)?;

    let report = CatalogSync::new(pool, &client).run().await?;
    tracing::info!(
        "Catalog sync finished: {} created, {} updated, {} skipped, {} failed",
        report.created,
        report.updated,
        report.skipped,
        report.failed
    );
    Ok(())
}

/// Roll up one day of analytics events.
///
/// # Errors
///
/// Returns `MaintenanceError::Repository` if the rollup query fails.
pub async fn rollup_analytics(
    pool: &PgPool,
    date: Option<NaiveDate>,
) -> Result<(), MaintenanceError> {
    let day = date.unwrap_or_else(yesterday);
    let summary = AnalyticsService::new(pool).rollup(day).await?;
    tracing::info!(
        "Rolled up {}: {} page views, {} orders, revenue {}",
        summary.day,
        summary.page_views,
        summary.orders,
        summary.revenue
    );
    Ok(())
}
