//! Checkout and order confirmation pages.
//!
//! The checkout page hosts Stripe Elements; `static/js/checkout.js` drives
//! the shipping-rate, payment-intent and confirm API calls.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use inkdrop_core::format_money;

use super::internal_error;
use crate::db::OrderRepository;
use crate::filters;
use crate::middleware::session;
use crate::services::cart::{CartService, CartView};
use crate::services::settings::SettingsService;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub store_name: String,
    pub publishable_key: String,
    pub item_count: u32,
    pub subtotal: String,
    pub flat_shipping: String,
    pub donation: String,
    pub live_rates: bool,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub store_name: String,
    pub order_number: Option<String>,
    pub total: Option<String>,
}

/// `GET /checkout`
///
/// Sends visitors with an empty cart back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response, StatusCode> {
    let token = session::cart_token(&session).await;
    let cart = CartService::new(state.pool())
        .lines(token)
        .await
        .map(CartView::from_lines)
        .map_err(internal_error)?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let settings = SettingsService::new(&state).get().await.map_err(internal_error)?;
    Ok(CheckoutTemplate {
        store_name: settings.store_name,
        publishable_key: state.config().stripe.publishable_key.clone(),
        item_count: cart.item_count,
        subtotal: format_money(cart.subtotal),
        flat_shipping: format_money(settings.flat_shipping_rate),
        donation: format_money(settings.donation_amount),
        live_rates: state.printful().is_some(),
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(default)]
    pub order: Option<String>,
}

/// `GET /checkout/success?order=`
#[instrument(skip(state))]
pub async fn success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let settings = SettingsService::new(&state).get().await.map_err(internal_error)?;
    let order = match query.order.as_deref() {
        Some(number) => OrderRepository::new(state.pool())
            .get_by_number(number)
            .await
            .map_err(internal_error)?,
        None => None,
    };

    Ok(SuccessTemplate {
        store_name: settings.store_name,
        order_number: order.as_ref().map(|o| o.order_number.clone()),
        total: order.map(|o| format_money(o.totals.total)),
    })
}
