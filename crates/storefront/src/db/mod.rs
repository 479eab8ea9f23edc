//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `products` - Catalog, with variant and image lists as JSONB
//! - `carts` - One row per cart token, line items as JSONB
//! - `orders` - Immutable order records with payment and fulfillment state
//! - `promotions` - Discount rules
//! - `admins` - Back-office accounts
//! - `settings` - Store-wide key/value settings
//! - `analytics_events` / `analytics_daily_summary` - Event log and rollups
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p inkdrop-cli -- migrate
//! ```

pub mod admins;
pub mod analytics;
pub mod carts;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Embedded migrations from `crates/storefront/migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use admins::AdminRepository;
pub use analytics::AnalyticsRepository;
pub use carts::CartRepository;
pub use orders::{OrderRepository, OrderStats};
pub use products::{ProductFilter, ProductRepository, ProductSort};
pub use promotions::PromotionRepository;
pub use settings::SettingsRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations onto `Conflict`, everything else onto `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse a stored text column into a domain value.
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} in database: {e}")))
}

/// Page of results plus the numbers needed to render pagination.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: i64) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        let total_pages = u32::try_from((total + limit_i64 - 1) / limit_i64).unwrap_or(u32::MAX);
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Transform the items, keeping the paging numbers.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Normalized page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 24;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp user-supplied values: page starts at 1, limit within `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    #[must_use]
    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, Pagination::MAX_LIMIT);
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), None);
        assert_eq!(p.limit, Pagination::DEFAULT_LIMIT);
        assert_eq!(p.offset(), 48);
    }

    #[test]
    fn test_page_total_pages_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 1, 10, 21);
        assert_eq!(page.total_pages, 3);
        let page: Page<u8> = Page::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 0);
    }
}
