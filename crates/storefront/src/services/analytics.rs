//! Analytics: fire-and-forget event logging and dashboard aggregates.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use crate::db::{AnalyticsRepository, RepositoryError};
use crate::models::analytics::{AnalyticsOverview, DailySummary, NewEvent, percentage};

/// Largest reporting window the dashboard accepts.
pub const MAX_DAYS: u32 = 365;

/// Default reporting window.
pub const DEFAULT_DAYS: u32 = 30;

const TOP_LIMIT: i64 = 10;

/// Record an event without waiting for the write.
///
/// Failures are logged and dropped; analytics never fails a request.
pub fn track(pool: &PgPool, event: NewEvent) {
    let pool = pool.clone();
    tokio::spawn(async move {
        let event_type = event.event_type;
        if let Err(e) = AnalyticsRepository::new(&pool).insert(&event).await {
            warn!(%event_type, error = %e, "Failed to record analytics event");
        }
    });
}

/// Analytics service.
pub struct AnalyticsService<'a> {
    repo: AnalyticsRepository<'a>,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: AnalyticsRepository::new(pool),
        }
    }

    /// Dashboard numbers for the last `days` days (clamped to `1..=MAX_DAYS`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any aggregate query fails.
    #[instrument(skip(self))]
    pub async fn overview(&self, days: u32) -> Result<AnalyticsOverview, RepositoryError> {
        let days = days.clamp(1, MAX_DAYS);
        let since = Utc::now() - Duration::days(i64::from(days));

        let events = self.repo.event_counts(since).await?;
        let unique_sessions = self.repo.unique_sessions(since).await?;
        let (orders, revenue) = self.repo.order_totals(since).await?;
        let top_products = self.repo.top_products(since, TOP_LIMIT).await?;
        let top_searches = self.repo.top_searches(since, TOP_LIMIT).await?;
        let daily = self.repo.daily(since.date_naive()).await?;

        Ok(AnalyticsOverview {
            days,
            since,
            events,
            unique_sessions,
            orders,
            revenue,
            average_order_value: average(revenue, orders),
            conversion_rate: percentage(orders, unique_sessions),
            top_products,
            top_searches,
            daily,
        })
    }

    /// Recompute the rollup row for `day`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the rollup query fails.
    #[instrument(skip(self))]
    pub async fn rollup(&self, day: NaiveDate) -> Result<DailySummary, RepositoryError> {
        let summary = self.repo.rollup_day(day).await?;
        debug!(%day, page_views = summary.page_views, orders = summary.orders, "Rolled up analytics");
        Ok(summary)
    }
}

/// Yesterday in UTC, the default rollup day.
#[must_use]
pub fn yesterday() -> NaiveDate {
    (Utc::now() - Duration::days(1)).date_naive()
}

fn average(revenue: Decimal, orders: i64) -> Decimal {
    if orders <= 0 {
        return Decimal::ZERO;
    }
    (revenue / Decimal::from(orders)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_order_value() {
        assert_eq!(average(Decimal::new(10000, 2), 3), Decimal::new(3333, 2));
        assert_eq!(average(Decimal::new(10000, 2), 0), Decimal::ZERO);
    }

    #[test]
    fn test_yesterday_is_before_today() {
        assert!(yesterday() < Utc::now().date_naive());
    }
}
