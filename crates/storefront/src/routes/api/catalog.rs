//! Catalog, search and public settings endpoints.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use inkdrop_core::{CurrencyCode, ProductCategory};

use super::ok;
use super::extract::{Path, Query};
use crate::db::{Pagination, ProductFilter, ProductSort};
use crate::error::{AppError, Result};
use crate::middleware::session;
use crate::models::StoreSettings;
use crate::models::analytics::{EventType, NewEvent};
use crate::services::analytics;
use crate::services::catalog::{CatalogService, FEATURED_LIMIT};
use crate::services::settings::SettingsService;
use crate::state::AppState;

/// Query string for product listings, shared with the HTML listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl CatalogQuery {
    /// Parsed category, treating a blank value as "all".
    ///
    /// # Errors
    ///
    /// Returns the parse message for an unknown category.
    pub fn category(&self) -> std::result::Result<Option<ProductCategory>, String> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::parse)
            .transpose()
    }

    /// Filter and pagination for the catalog service.
    ///
    /// # Errors
    ///
    /// Returns a message when the category is unknown.
    pub fn to_filter(&self) -> std::result::Result<(ProductFilter, Pagination), String> {
        let filter = ProductFilter {
            category: self.category()?,
            size: self
                .size
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort: self.sort.unwrap_or_default(),
            ..ProductFilter::default()
        };
        Ok((filter, Pagination::new(self.page, self.limit)))
    }
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let (filter, pagination) = query.to_filter().map_err(AppError::BadRequest)?;
    let page = CatalogService::new(state.pool())
        .browse(filter, pagination)
        .await?;
    Ok(ok(page))
}

/// `GET /api/products/featured`
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = CatalogService::new(state.pool())
        .featured(FEATURED_LIMIT)
        .await?;
    Ok(ok(products))
}

/// `GET /api/products/{slug}`
#[instrument(skip(state, session))]
pub async fn product(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool())
        .product(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    analytics::track(
        state.pool(),
        NewEvent::new(EventType::ProductView)
            .with_session(session::visitor_id(&session).await)
            .with_product(product.id)
            .with_path(format!("/products/{slug}")),
    );
    Ok(ok(product))
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = CatalogService::new(state.pool()).categories().await?;
    Ok(ok(categories))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/search?q=`
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let products = CatalogService::new(state.pool()).search(&query.q).await?;

    let q = query.q.trim();
    if !q.is_empty() {
        analytics::track(
            state.pool(),
            NewEvent::new(EventType::Search)
                .with_session(session::visitor_id(&session).await)
                .with_query(q)
                .with_value(Decimal::from(products.len())),
        );
    }
    Ok(ok(products))
}

/// Settings the browser needs to render prices and start checkout.
#[derive(Debug, Serialize)]
pub struct PublicSettings {
    #[serde(flatten)]
    pub settings: StoreSettings,
    pub currency: CurrencyCode,
    pub stripe_publishable_key: String,
    pub live_shipping_rates: bool,
}

/// `GET /api/settings`
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let settings = SettingsService::new(&state).get().await?;
    Ok(ok(PublicSettings {
        settings,
        currency: state.config().stripe.currency,
        stripe_publishable_key: state.config().stripe.publishable_key.clone(),
        live_shipping_rates: state.printful().is_some(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_category_means_all() {
        let query = CatalogQuery {
            category: Some("  ".to_string()),
            ..CatalogQuery::default()
        };
        assert_eq!(query.category().unwrap(), None);
    }

    #[test]
    fn test_filter_from_query() {
        let query = CatalogQuery {
            category: Some("hoodies".to_string()),
            size: Some("XL".to_string()),
            sort: Some(ProductSort::PriceAsc),
            page: Some(0),
            limit: Some(500),
        };
        let (filter, pagination) = query.to_filter().unwrap();
        assert_eq!(filter.category, Some(ProductCategory::Hoodies));
        assert_eq!(filter.size.as_deref(), Some("XL"));
        assert_eq!(filter.sort, ProductSort::PriceAsc);
        assert!(!filter.include_inactive);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, Pagination::MAX_LIMIT);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let query = CatalogQuery {
            category: Some("spaceships".to_string()),
            ..CatalogQuery::default()
        };
        assert!(query.to_filter().is_err());
    }
}
