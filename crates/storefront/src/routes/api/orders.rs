//! Public order lookup.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use super::ok;
use super::extract::{Path, Query};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub email: String,
}

/// `GET /api/orders/{order_number}?email=`
///
/// The email must match the order's; any mismatch answers 404 so order
/// numbers cannot be probed.
#[instrument(skip(state, query))]
pub async fn lookup(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound("Order not found".to_string());
    let email = query.email.trim();
    if email.is_empty() {
        return Err(not_found());
    }

    let order = OrderRepository::new(state.pool())
        .get_by_number(order_number.trim())
        .await?
        .filter(|order| order.email.as_str().eq_ignore_ascii_case(email))
        .ok_or_else(not_found)?;
    Ok(ok(order))
}
