//! JSON API under `/api`.
//!
//! Every success is `{ "success": true, "data": ... }`; failures come from
//! [`AppError`](crate::error::AppError) as `{ "success": false, "message": ... }`.

pub mod admin;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod extract;
pub mod orders;
pub mod webhooks;

use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use serde::Serialize;

use crate::middleware::checkout_rate_limiter;
use crate::state::AppState;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

fn checkout_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/shipping-rates", post(checkout::shipping_rates))
        .route("/payment-intent", post(checkout::payment_intent))
        .route("/confirm", post(checkout::confirm));

    match checkout_rate_limiter() {
        Some(limiter) => router.layer(limiter),
        None => {
            tracing::warn!("Checkout rate limiter disabled: invalid quota");
            router
        }
    }
}

/// Public storefront API.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/products", get(catalog::list_products))
        .route("/products/featured", get(catalog::featured))
        .route("/products/{slug}", get(catalog::product))
        .route("/categories", get(catalog::categories))
        .route("/search", get(catalog::search))
        .route("/settings", get(catalog::settings))
        // Cart
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{line_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        // Checkout
        .route("/promotions/validate", post(checkout::validate_promotion))
        .nest("/checkout", checkout_routes())
        .route("/orders/{order_number}", get(orders::lookup))
        // Analytics
        .route("/analytics/events", post(analytics::record))
        // Webhooks
        .route("/webhooks/stripe", post(webhooks::stripe))
        .route("/webhooks/printful", post(webhooks::printful))
        // Back office
        .nest("/admin", admin::routes())
}
