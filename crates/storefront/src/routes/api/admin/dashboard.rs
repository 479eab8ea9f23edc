//! Admin dashboard numbers.

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use crate::db::{OrderRepository, OrderStats, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::OrderSummary;
use crate::routes::api::ok;
use crate::state::AppState;

/// Variants at or below this stock count as low.
const LOW_STOCK_THRESHOLD: i32 = 5;

const RECENT_ORDERS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub orders: OrderStats,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub recent_orders: Vec<OrderSummary>,
    pub fulfillment_enabled: bool,
}

impl Dashboard {
    /// Gather the dashboard numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if any query fails.
    pub async fn load(state: &AppState) -> Result<Self> {
        let orders = OrderRepository::new(state.pool());
        let products = ProductRepository::new(state.pool());

        Ok(Self {
            orders: orders.stats().await?,
            active_products: products.count_active().await?,
            low_stock_products: products.count_low_stock(LOW_STOCK_THRESHOLD).await?,
            recent_orders: orders
                .recent(RECENT_ORDERS)
                .await?
                .iter()
                .map(OrderSummary::from)
                .collect(),
            fulfillment_enabled: state.printful().is_some(),
        })
    }
}

/// `GET /api/admin/dashboard`
#[instrument(skip_all)]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(Dashboard::load(&state).await?))
}
