//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use super::products::ProductView;
use super::{internal_error, store_name};
use crate::filters;
use crate::models::CategorySummary;
use crate::services::catalog::{CatalogService, FEATURED_LIMIT};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub store_name: String,
    pub featured: Vec<ProductView>,
    pub categories: Vec<CategorySummary>,
}

/// `GET /`
///
/// Featured products and the categories that have something in them.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let catalog = CatalogService::new(state.pool());
    let featured = catalog.featured(FEATURED_LIMIT).await.map_err(internal_error)?;
    let categories = catalog
        .categories()
        .await
        .map_err(internal_error)?
        .into_iter()
        .filter(|c| c.product_count > 0)
        .collect();

    Ok(HomeTemplate {
        store_name: store_name(&state).await,
        featured: featured.iter().map(ProductView::from).collect(),
        categories,
    })
}
