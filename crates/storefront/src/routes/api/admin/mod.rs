//! Back-office API under `/api/admin`.
//!
//! Every handler takes one of the admin extractors: reads need any admin,
//! mutations need a role that can write, user management needs a super admin.

pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod settings;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

fn login_routes() -> Router<AppState> {
    let router = Router::new().route("/login", post(auth::login));
    match login_rate_limiter() {
        Some(limiter) => router.layer(limiter),
        None => {
            tracing::warn!("Login rate limiter disabled: invalid quota");
            router
        }
    }
}

/// Admin API routes.
pub fn routes() -> Router<AppState> {
    let auth_routes = login_routes()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    Router::new()
        .nest("/auth", auth_routes)
        .route("/dashboard", get(dashboard::show))
        // Products
        .route("/products", get(products::list).post(products::create))
        .route("/products/sync", post(products::sync))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        // Orders
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/fulfill", post(orders::fulfill))
        .route("/orders/{id}/refresh", post(orders::refresh))
        .route("/orders/{id}/refund", post(orders::refund))
        .route("/orders/{id}/status", put(orders::set_status))
        // Promotions
        .route("/promotions", get(promotions::list).post(promotions::create))
        .route(
            "/promotions/{id}",
            get(promotions::show)
                .put(promotions::update)
                .delete(promotions::delete),
        )
        // Settings
        .route("/settings", get(settings::show).put(settings::update))
        // Analytics
        .route("/analytics", get(analytics::overview))
        .route("/analytics/rollup", post(analytics::rollup))
        // Admin users
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}/unlock", post(users::unlock))
}
