//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /products               - Product listing
//! GET  /products/{slug}        - Product detail
//! GET  /cart                   - Cart page
//! GET  /checkout               - Checkout (Stripe Elements)
//! GET  /checkout/success       - Order confirmation
//! GET  /admin/login            - Admin login page
//! GET  /admin                  - Admin dashboard (requires admin session)
//!
//! /api/...                     - JSON API, see [`api`]
//! ```

pub mod admin;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use std::fmt::Display;

use axum::{Router, http::StatusCode, routing::get};

use crate::models::StoreSettings;
use crate::services::settings::SettingsService;
use crate::state::AppState;

/// Log a page-rendering failure and turn it into a 500.
pub(crate) fn internal_error(err: impl Display) -> StatusCode {
    tracing::error!(error = %err, "Page handler failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Store name for page headers, falling back to the default name.
pub(crate) async fn store_name(state: &AppState) -> String {
    match SettingsService::new(state).get().await {
        Ok(settings) => settings.store_name,
        Err(e) => {
            tracing::warn!(error = %e, "Settings unavailable, using default store name");
            StoreSettings::default().store_name
        }
    }
}

/// Create the product page routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the checkout page routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/success", get(checkout::success))
}

/// Create the admin page routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/login", get(admin::login_page))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/cart", get(cart::show))
        .nest("/checkout", checkout_routes())
        .nest("/admin", admin_routes())
        .nest("/api", api::routes())
}
