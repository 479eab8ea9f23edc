//! Admin back office pages.
//!
//! Both pages are thin shells; `static/js/admin.js` talks to `/api/admin`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use inkdrop_core::format_money;

use super::{internal_error, store_name};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, OrderSummary, session_keys};
use crate::routes::api::admin::dashboard::Dashboard;
use crate::state::AppState;

/// Admin login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub store_name: String,
}

/// Recent order row for the dashboard table.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: i32,
    pub order_number: String,
    pub customer_name: String,
    pub total: String,
    pub payment_status: String,
    pub fulfillment_status: String,
    pub created_at: String,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.as_i32(),
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            total: format_money(order.total),
            payment_status: order.payment_status.to_string(),
            fulfillment_status: order.fulfillment_status.to_string(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub store_name: String,
    pub admin_name: String,
    pub admin_role: String,
    pub can_write: bool,
    pub total_orders: i64,
    pub revenue: Decimal,
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub awaiting_fulfillment: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub fulfillment_enabled: bool,
    pub recent_orders: Vec<OrderRowView>,
}

/// `GET /admin/login`
///
/// Already logged-in admins go straight to the dashboard.
#[instrument(skip(state, session))]
pub async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    let logged_in = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some();
    if logged_in {
        return Redirect::to("/admin").into_response();
    }

    LoginTemplate {
        store_name: store_name(&state).await,
    }
    .into_response()
}

/// `GET /admin`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let dashboard = Dashboard::load(&state).await.map_err(internal_error)?;

    Ok(DashboardTemplate {
        store_name: store_name(&state).await,
        admin_name: admin.name,
        admin_role: admin.role.to_string(),
        can_write: admin.role.can_write(),
        total_orders: dashboard.orders.total_orders,
        revenue: dashboard.orders.revenue,
        orders_today: dashboard.orders.orders_today,
        revenue_today: dashboard.orders.revenue_today,
        awaiting_fulfillment: dashboard.orders.awaiting_fulfillment,
        active_products: dashboard.active_products,
        low_stock_products: dashboard.low_stock_products,
        fulfillment_enabled: dashboard.fulfillment_enabled,
        recent_orders: dashboard.recent_orders.iter().map(OrderRowView::from).collect(),
    })
}
