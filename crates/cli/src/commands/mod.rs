//! CLI command implementations.
//!
//! Every command talks to the storefront database named by
//! `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

pub mod admin;
pub mod maintenance;
pub mod migrate;

use sqlx::PgPool;

use inkdrop_storefront::config::{ConfigError, get_database_url};
use inkdrop_storefront::db;

/// Errors connecting to the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the storefront database.
///
/// # Errors
///
/// Returns `ConnectError` if the URL is missing or the database is unreachable.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
