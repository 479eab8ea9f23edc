//! Checkout endpoints: promotion validation, shipping quotes, payment intent
//! creation and order confirmation.

use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use inkdrop_core::Address;

use super::ok;
use super::extract::Json;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session;
use crate::models::analytics::{EventType, NewEvent};
use crate::services::analytics;
use crate::services::cart::CartService;
use crate::services::checkout::{CheckoutRequest, CheckoutService, OrderReceipt};
use crate::services::promotions::PromotionService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidatePromotion {
    pub code: String,
}

/// `POST /api/promotions/validate`
///
/// Evaluates the code against the current cart.
#[instrument(skip(state, session, body))]
pub async fn validate_promotion(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ValidatePromotion>,
) -> Result<impl IntoResponse> {
    let lines = CartService::new(state.pool())
        .lines(session::cart_token(&session).await)
        .await?;
    let applied = PromotionService::new(state.pool())
        .validate_code(&body.code, &lines, Utc::now())
        .await?;
    Ok(ok(applied))
}

#[derive(Debug, Deserialize)]
pub struct ShippingRatesRequest {
    pub address: Address,
}

/// `POST /api/checkout/shipping-rates`
#[instrument(skip(state, session, body))]
pub async fn shipping_rates(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ShippingRatesRequest>,
) -> Result<impl IntoResponse> {
    let quote = CheckoutService::new(&state)
        .shipping_quote(session::cart_token(&session).await, body.address)
        .await?;
    Ok(ok(quote))
}

/// `POST /api/checkout/payment-intent`
///
/// The draft is kept in the session until the payment is confirmed.
#[instrument(skip(state, session, request))]
pub async fn payment_intent(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let (draft, payment) = CheckoutService::new(&state)
        .create_payment_intent(session::cart_token(&session).await, request)
        .await?;

    session::set_checkout_draft(&session, &draft)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    add_breadcrumb(
        "checkout",
        "Payment intent created",
        Some(&[("payment_intent_id", &payment.payment_intent_id)]),
    );
    analytics::track(
        state.pool(),
        NewEvent::new(EventType::BeginCheckout)
            .with_session(session::visitor_id(&session).await)
            .with_value(payment.totals.total),
    );
    Ok(ok(payment))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub payment_intent_id: String,
}

/// `POST /api/checkout/confirm`
///
/// Answers with an [`OrderReceipt`]; the full order is only available
/// through the email-checked lookup.
#[instrument(skip(state, session, body), fields(payment_intent_id = %body.payment_intent_id))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ConfirmRequest>,
) -> Result<impl IntoResponse> {
    let token = session::cart_token(&session).await;
    let draft = session::checkout_draft(&session).await;
    let order = CheckoutService::new(&state)
        .confirm(token, draft, &body.payment_intent_id)
        .await?;

    if let Err(e) = session::finish_checkout(&session).await {
        warn!(error = %e, "Failed to clear checkout from session");
    }
    analytics::track(
        state.pool(),
        NewEvent::new(EventType::Purchase)
            .with_session(session::visitor_id(&session).await)
            .with_value(order.totals.total)
            .with_metadata(serde_json::json!({ "order_number": order.order_number })),
    );
    Ok(ok(OrderReceipt::from(&order)))
}
