//! Admin analytics overview and rollups.

use axum::{extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::routes::api::extract::Query;
use crate::routes::api::ok;
use crate::services::analytics::{AnalyticsService, DEFAULT_DAYS, yesterday};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

/// `GET /api/admin/analytics?days=`
#[instrument(skip_all)]
pub async fn overview(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> Result<impl IntoResponse> {
    let overview = AnalyticsService::new(state.pool())
        .overview(query.days.unwrap_or(DEFAULT_DAYS))
        .await?;
    Ok(ok(overview))
}

#[derive(Debug, Deserialize)]
pub struct RollupQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// `POST /api/admin/analytics/rollup?date=`
///
/// Rolls up yesterday when no date is given.
#[instrument(skip_all)]
pub async fn rollup(
    RequireAdminWrite(_admin): RequireAdminWrite,
    State(state): State<AppState>,
    Query(query): Query<RollupQuery>,
) -> Result<impl IntoResponse> {
    let summary = AnalyticsService::new(state.pool())
        .rollup(query.date.unwrap_or_else(yesterday))
        .await?;
    Ok(ok(summary))
}
