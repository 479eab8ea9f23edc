//! Stripe and Printful webhook receivers.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};

use super::ok;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::printful::WebhookEvent;
use crate::services::fulfillment::FulfillmentService;
use crate::services::refunds::RefundService;
use crate::state::AppState;
use crate::stripe::webhook::{DEFAULT_TOLERANCE_SECS, verify_signature};
use crate::stripe::{ChargeObject, Event};

/// Header carrying Stripe's webhook signature.
const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /api/webhooks/stripe`
///
/// The signature is checked when a webhook secret is configured. Database
/// failures return 500 so Stripe retries the delivery.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if let Some(secret) = &state.config().stripe.webhook_secret {
        let header = headers
            .get(STRIPE_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        verify_signature(
            &body,
            header,
            secret.expose_secret(),
            chrono::Utc::now().timestamp(),
            DEFAULT_TOLERANCE_SECS,
        )
        .map_err(|e| {
            warn!(error = %e, "Rejected Stripe webhook");
            AppError::BadRequest("Invalid signature".to_string())
        })?;
    }

    let event: Event = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Malformed event".to_string()))?;
    info!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");

    let refunds = RefundService::new(OrderRepository::new(state.pool()), state.stripe());
    match event.event_type.as_str() {
        "payment_intent.payment_failed" => {
            if let Some(intent_id) = event.data.object.get("id").and_then(|v| v.as_str()) {
                refunds.record_failed(intent_id).await?;
            }
        }
        "charge.refunded" => {
            let charge: ChargeObject = serde_json::from_value(event.data.object)
                .map_err(|_| AppError::BadRequest("Malformed charge".to_string()))?;
            if let Some(intent_id) = charge.payment_intent.as_deref() {
                refunds
                    .record_refunded(intent_id, charge.amount_refunded)
                    .await?;
            }
        }
        other => debug!(event_type = other, "Stripe event ignored"),
    }

    Ok(ok(()))
}

/// `POST /api/webhooks/printful`
///
/// Always answers 200, even for malformed payloads or unknown orders.
#[instrument(skip_all)]
pub async fn printful(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<WebhookEvent>(&body) {
        Ok(event) => {
            let service = FulfillmentService::new(
                state.pool(),
                state.printful(),
                state.config().stripe.currency,
            );
            if let Err(e) = service.apply_webhook(&event).await {
                warn!(event_type = %event.event_type, error = %e, "Failed to apply Printful webhook");
            }
        }
        Err(e) => warn!(error = %e, "Malformed Printful webhook ignored"),
    }
    ok(())
}
