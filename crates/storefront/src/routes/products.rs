//! Product listing and detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use inkdrop_core::{ProductCategory, format_money};

use super::{internal_error, store_name};
use crate::filters;
use crate::middleware::session;
use crate::models::Product;
use crate::models::analytics::{EventType, NewEvent};
use crate::routes::api::catalog::CatalogQuery;
use crate::services::analytics;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub category: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_money(product.price),
            compare_at_price: product
                .compare_at_price
                .filter(|p| *p > product.price)
                .map(format_money),
            image: product.primary_image().map(str::to_string),
            images: product.images.clone(),
            category: product.category.label().to_string(),
            sizes: product.sizes().into_iter().map(str::to_string).collect(),
            colors: product.colors().into_iter().map(str::to_string).collect(),
            in_stock: product.variants.is_empty() || product.variants.iter().any(|v| v.stock > 0),
        }
    }
}

/// Category link in the listing sidebar.
#[derive(Clone)]
pub struct CategoryLink {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

fn category_links(active: Option<ProductCategory>) -> Vec<CategoryLink> {
    ProductCategory::ALL
        .iter()
        .map(|c| CategoryLink {
            slug: c.as_str(),
            label: c.label(),
            active: Some(*c) == active,
        })
        .collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub store_name: String,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryLink>,
    pub category: Option<String>,
    pub page: u32,
    pub total_pages: u32,
    pub total: i64,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub store_name: String,
    pub product: ProductView,
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let (filter, pagination) = query.to_filter().map_err(|_| StatusCode::BAD_REQUEST)?;
    let active = filter.category;
    let page = CatalogService::new(state.pool())
        .browse(filter, pagination)
        .await
        .map_err(internal_error)?;

    Ok(ProductsIndexTemplate {
        store_name: store_name(&state).await,
        products: page.items.iter().map(ProductView::from).collect(),
        categories: category_links(active),
        category: active.map(|c| c.as_str().to_string()),
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
    })
}

/// `GET /products/{slug}`
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let product = CatalogService::new(state.pool())
        .product(&slug)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    analytics::track(
        state.pool(),
        NewEvent::new(EventType::ProductView)
            .with_session(session::visitor_id(&session).await)
            .with_product(product.id)
            .with_path(format!("/products/{slug}")),
    );

    Ok(ProductShowTemplate {
        store_name: store_name(&state).await,
        product: ProductView::from(&product),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_links_mark_active() {
        let links = category_links(Some(ProductCategory::Mugs));
        assert_eq!(links.len(), ProductCategory::ALL.len());
        assert_eq!(links.iter().filter(|l| l.active).count(), 1);
        assert!(links.iter().any(|l| l.active && l.slug == "mugs"));
    }
}
