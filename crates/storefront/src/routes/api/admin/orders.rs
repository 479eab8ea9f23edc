//! Admin order management: lists, fulfillment actions, refunds.

use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use inkdrop_core::fulfillment::TrackingInfo;
use inkdrop_core::{FulfillmentStatus, OrderId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::{Order, OrderFilter, OrderSummary};
use crate::routes::api::extract::{Json, Path, Query};
use crate::routes::api::ok;
use crate::services::fulfillment::FulfillmentService;
use crate::services::refunds::RefundService;
use crate::state::AppState;

async fn load(state: &AppState, id: i32) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_id(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

fn fulfillment(state: &AppState) -> FulfillmentService<'_> {
    FulfillmentService::new(
        state.pool(),
        state.printful(),
        state.config().stripe.currency,
    )
}

/// `GET /api/admin/orders?status=&q=&page=`
#[instrument(skip_all)]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse> {
    let page = OrderRepository::new(state.pool()).list(&filter).await?;
    Ok(ok(page.map(|order| OrderSummary::from(&order))))
}

/// `GET /api/admin/orders/{id}`
#[instrument(skip_all, fields(order_id = id))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    Ok(ok(load(&state, id).await?))
}

/// `POST /api/admin/orders/{id}/fulfill`
///
/// Sends an order that never reached Printful.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = id))]
pub async fn fulfill(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order = load(&state, id).await?;
    let order = fulfillment(&state).submit(&order).await?;
    Ok(ok(order))
}

/// `POST /api/admin/orders/{id}/refresh`
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = id))]
pub async fn refresh(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order = load(&state, id).await?;
    let order = fulfillment(&state).refresh(&order).await?;
    Ok(ok(order))
}

#[derive(Debug, Default, Deserialize)]
pub struct RefundRequest {
    /// Amount to refund; everything refundable when absent.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// `POST /api/admin/orders/{id}/refund`
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = id))]
pub async fn refund(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Option<Json<RefundRequest>>,
) -> Result<impl IntoResponse> {
    let amount = body.and_then(|Json(body)| body.amount);
    let order = load(&state, id).await?;
    let order = RefundService::new(OrderRepository::new(state.pool()), state.stripe())
        .refund(&order, amount)
        .await?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: FulfillmentStatus,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

impl StatusUpdate {
    /// Tracking to store: supplied fields replace stored ones, blanks are
    /// ignored, and a shipped status without a date is stamped now.
    fn tracking(&self, order: &Order) -> TrackingInfo {
        let current = &order.fulfillment.tracking;
        let pick = |new: &Option<String>, old: &Option<String>| {
            new.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .or_else(|| old.clone())
        };
        let shipped_at = current
            .shipped_at
            .or_else(|| self.status.has_shipped().then(Utc::now));
        TrackingInfo {
            carrier: pick(&self.carrier, &current.carrier),
            tracking_number: pick(&self.tracking_number, &current.tracking_number),
            tracking_url: pick(&self.tracking_url, &current.tracking_url),
            shipped_at,
        }
    }
}

/// `PUT /api/admin/orders/{id}/status`
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = id))]
pub async fn set_status(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusUpdate>,
) -> Result<impl IntoResponse> {
    let order = load(&state, id).await?;
    let tracking = body.tracking(&order);
    let updated = fulfillment(&state)
        .set_status(&order, body.status.clone(), tracking)
        .await?;
    info!(status = %updated.fulfillment.status, "Fulfillment status set by admin");
    Ok(ok(updated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::tests::order;

    #[test]
    fn test_shipped_status_is_stamped() {
        let update: StatusUpdate = serde_json::from_str(
            r#"{"status": "shipped", "carrier": "UPS", "tracking_number": "1Z999", "tracking_url": " "}"#,
        )
        .unwrap();
        let tracking = update.tracking(&order());
        assert!(tracking.shipped_at.is_some());
        assert_eq!(tracking.carrier.as_deref(), Some("UPS"));
        assert_eq!(tracking.tracking_url, None);
    }

    #[test]
    fn test_non_shipping_status_has_no_date() {
        let update: StatusUpdate = serde_json::from_str(r#"{"status": "on_hold"}"#).unwrap();
        assert!(update.tracking(&order()).is_empty());
    }
}
