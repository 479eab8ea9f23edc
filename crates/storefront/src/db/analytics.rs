//! Analytics repository: the append-only event log and daily rollups.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use super::RepositoryError;
use crate::models::analytics::{DailySummary, EventCount, NewEvent, TopProduct, TopSearch};

/// Repository for analytics database operations.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, event: &NewEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO analytics_events \
             (event_type, session_id, path, product_id, search_query, value, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.event_type.as_str())
        .bind(&event.session_id)
        .bind(&event.path)
        .bind(event.product_id)
        .bind(&event.search_query)
        .bind(event.value)
        .bind(event.metadata.as_ref().map(Json))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Event counts by type since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn event_counts(&self, since: DateTime<Utc>) -> Result<Vec<EventCount>, RepositoryError> {
        let rows: Vec<EventCount> = sqlx::query_as(
            "SELECT event_type, COUNT(*) AS count FROM analytics_events \
             WHERE created_at >= $1 GROUP BY event_type ORDER BY count DESC",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct visitor sessions since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unique_sessions(&self, since: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT session_id) FROM analytics_events \
             WHERE created_at >= $1 AND session_id IS NOT NULL",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Paid order count and revenue since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_totals(&self, since: DateTime<Utc>) -> Result<(i64, Decimal), RepositoryError> {
        let totals: (i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total), 0) FROM orders \
             WHERE created_at >= $1 AND payment_status IN ('succeeded', 'partially_refunded', 'refunded')",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// Most viewed products since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let rows: Vec<TopProduct> = sqlx::query_as(
            "SELECT e.product_id, p.name, COUNT(*) AS views \
             FROM analytics_events e LEFT JOIN products p ON p.id = e.product_id \
             WHERE e.created_at >= $1 AND e.event_type = 'product_view' AND e.product_id IS NOT NULL \
             GROUP BY e.product_id, p.name ORDER BY views DESC LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Most frequent search queries since `since`, case-folded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_searches(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TopSearch>, RepositoryError> {
        let rows: Vec<TopSearch> = sqlx::query_as(
            "SELECT lower(search_query) AS query, COUNT(*) AS count FROM analytics_events \
             WHERE created_at >= $1 AND event_type = 'search' AND search_query IS NOT NULL \
             GROUP BY lower(search_query) ORDER BY count DESC LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Recompute the rollup row for one UTC day.
    ///
    /// Running it twice for the same day gives the same row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rollup_day(&self, day: NaiveDate) -> Result<DailySummary, RepositoryError> {
        let summary: DailySummary = sqlx::query_as(
            "WITH ev AS ( \
               SELECT \
                 COUNT(*) FILTER (WHERE event_type = 'page_view') AS page_views, \
                 COUNT(*) FILTER (WHERE event_type = 'product_view') AS product_views, \
                 COUNT(*) FILTER (WHERE event_type = 'add_to_cart') AS add_to_carts, \
                 COUNT(*) FILTER (WHERE event_type = 'begin_checkout') AS checkouts, \
                 COUNT(*) FILTER (WHERE event_type = 'purchase') AS purchases, \
                 COUNT(*) FILTER (WHERE event_type = 'search') AS searches, \
                 COUNT(DISTINCT session_id) AS unique_sessions \
               FROM analytics_events \
               WHERE created_at >= $1::date AND created_at < $1::date + 1 \
             ), ord AS ( \
               SELECT COUNT(*) AS orders, COALESCE(SUM(total), 0) AS revenue FROM orders \
               WHERE created_at >= $1::date AND created_at < $1::date + 1 \
                 AND payment_status IN ('succeeded', 'partially_refunded', 'refunded') \
             ) \
             INSERT INTO analytics_daily_summary (day, page_views, product_views, add_to_carts, \
               checkouts, purchases, searches, unique_sessions, orders, revenue, updated_at) \
             SELECT $1, ev.page_views, ev.product_views, ev.add_to_carts, ev.checkouts, \
               ev.purchases, ev.searches, ev.unique_sessions, ord.orders, ord.revenue, NOW() \
             FROM ev, ord \
             ON CONFLICT (day) DO UPDATE SET page_views = EXCLUDED.page_views, \
               product_views = EXCLUDED.product_views, add_to_carts = EXCLUDED.add_to_carts, \
               checkouts = EXCLUDED.checkouts, purchases = EXCLUDED.purchases, \
               searches = EXCLUDED.searches, unique_sessions = EXCLUDED.unique_sessions, \
               orders = EXCLUDED.orders, revenue = EXCLUDED.revenue, updated_at = NOW() \
             RETURNING day, page_views, product_views, add_to_carts, checkouts, purchases, \
               searches, unique_sessions, orders, revenue, updated_at",
        )
        .bind(day)
        .fetch_one(self.pool)
        .await?;
        Ok(summary)
    }

    /// Rollup rows from `since` onwards, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily(&self, since: NaiveDate) -> Result<Vec<DailySummary>, RepositoryError> {
        let rows: Vec<DailySummary> = sqlx::query_as(
            "SELECT day, page_views, product_views, add_to_carts, checkouts, purchases, \
             searches, unique_sessions, orders, revenue, updated_at \
             FROM analytics_daily_summary WHERE day >= $1 ORDER BY day",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
