//! Database migration command.
//!
//! ```bash
//! inkdrop migrate
//! ```
//!
//! Migration files live in `crates/storefront/migrations/` and are embedded
//! into the storefront library at build time.

use sqlx::PgPool;

use inkdrop_storefront::db::MIGRATOR;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or was modified after being
/// applied.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running storefront migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!("Migrations complete ({} known)", MIGRATOR.iter().count());
    Ok(())
}
