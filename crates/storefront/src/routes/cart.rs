//! Cart page.
//!
//! The page renders the current lines; quantity changes go through the
//! `/api/cart` endpoints from `static/js/cart.js`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use inkdrop_core::cart::{CartLine, MAX_LINE_QUANTITY};
use inkdrop_core::format_money;

use super::{internal_error, store_name};
use crate::filters;
use crate::middleware::session;
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub product_name: String,
    pub product_slug: String,
    pub image: Option<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            product_name: line.product_name.clone(),
            product_slug: line.product_slug.clone(),
            image: line.image.clone(),
            variant: line.variant.label(),
            quantity: line.quantity,
            unit_price: format_money(line.unit_price),
            line_total: format_money(line.line_total()),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub store_name: String,
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub max_quantity: u32,
}

/// `GET /cart`
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, StatusCode> {
    let token = session::cart_token(&session).await;
    let view = CartService::new(state.pool())
        .lines(token)
        .await
        .map(CartView::from_lines)
        .map_err(internal_error)?;

    Ok(CartShowTemplate {
        store_name: store_name(&state).await,
        lines: view.items.iter().map(CartLineView::from).collect(),
        item_count: view.item_count,
        subtotal: format_money(view.subtotal),
        max_quantity: MAX_LINE_QUANTITY,
    })
}
