//! Cart endpoints.
//!
//! The cart token lives in the session; the first add creates it.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use super::ok;
use super::extract::{Json, Path};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session;
use crate::models::analytics::{EventType, NewEvent};
use crate::services::analytics;
use crate::services::cart::{AddToCart, CartService, CartView};
use crate::state::AppState;

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session: {err}"))
}

/// `GET /api/cart`
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let token = session::cart_token(&session).await;
    let lines = CartService::new(state.pool()).lines(token).await?;
    Ok(ok(CartView::from_lines(lines)))
}

/// `POST /api/cart/items`
#[instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<AddToCart>,
) -> Result<impl IntoResponse> {
    let token = session::ensure_cart_token(&session)
        .await
        .map_err(session_error)?;
    let lines = CartService::new(state.pool()).add_item(token, &input).await?;

    let product_id = input.product_id.to_string();
    add_breadcrumb("cart", "Item added", Some(&[("product_id", &product_id)]));
    analytics::track(
        state.pool(),
        NewEvent::new(EventType::AddToCart)
            .with_session(session::visitor_id(&session).await)
            .with_product(input.product_id)
            .with_value(rust_decimal::Decimal::from(input.quantity)),
    );
    Ok(ok(CartView::from_lines(lines)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: u32,
}

/// `PATCH /api/cart/items/{line_id}`
///
/// A quantity of zero removes the line.
#[instrument(skip(state, session))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<Uuid>,
    Json(body): Json<UpdateQuantity>,
) -> Result<impl IntoResponse> {
    let token = session::cart_token(&session)
        .await
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;
    let lines = CartService::new(state.pool())
        .update_quantity(token, line_id, body.quantity)
        .await?;
    Ok(ok(CartView::from_lines(lines)))
}

/// `DELETE /api/cart/items/{line_id}`
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let token = session::cart_token(&session)
        .await
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;
    let service = CartService::new(state.pool());
    let removed = service
        .lines(Some(token))
        .await?
        .into_iter()
        .find(|line| line.id == line_id);
    let lines = service.remove_item(token, line_id).await?;

    if let Some(line) = removed {
        analytics::track(
            state.pool(),
            NewEvent::new(EventType::RemoveFromCart)
                .with_session(session::visitor_id(&session).await)
                .with_product(line.product_id),
        );
    }
    Ok(ok(CartView::from_lines(lines)))
}

/// `DELETE /api/cart`
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    if let Some(token) = session::cart_token(&session).await {
        CartService::new(state.pool()).clear(token).await?;
    }
    Ok(ok(CartView::from_lines(Vec::new())))
}
