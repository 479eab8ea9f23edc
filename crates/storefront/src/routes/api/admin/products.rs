//! Admin product management and Printful catalog sync.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::{info, instrument};

use inkdrop_core::ProductId;

use crate::db::{ProductFilter, ProductRepository, ProductSort};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::ProductInput;
use crate::routes::api::catalog::CatalogQuery;
use crate::routes::api::extract::{Json, Path, Query};
use crate::routes::api::ok;
use crate::services::catalog_sync::CatalogSync;
use crate::services::fulfillment::FulfillmentError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AdminProductQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl AdminProductQuery {
    fn catalog(&self) -> CatalogQuery {
        CatalogQuery {
            category: self.category.clone(),
            size: None,
            sort: self.sort,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// `GET /api/admin/products`
///
/// Includes inactive products.
#[instrument(skip_all)]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminProductQuery>,
) -> Result<impl IntoResponse> {
    let (filter, pagination) = query.catalog().to_filter().map_err(AppError::BadRequest)?;
    let filter = ProductFilter {
        include_inactive: true,
        search: query.q.filter(|q| !q.trim().is_empty()),
        ..filter
    };
    let page = ProductRepository::new(state.pool())
        .list(&filter, pagination)
        .await?;
    Ok(ok(page))
}

/// `GET /api/admin/products/{id}`
#[instrument(skip_all, fields(product_id = id))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(ok(product))
}

/// `POST /api/admin/products`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok(ok(product))
}

/// `PUT /api/admin/products/{id}`
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = id))]
pub async fn update(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &input)
        .await?;
    info!(product_id = %product.id, "Product updated");
    Ok(ok(product))
}

/// `DELETE /api/admin/products/{id}`
///
/// Products are deactivated, never removed, so past orders keep their links.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = id))]
pub async fn delete(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .deactivate(ProductId::new(id))
        .await?;
    info!(product_id = id, "Product deactivated");
    Ok(ok(()))
}

/// `POST /api/admin/products/sync`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn sync(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let printful = state.printful().ok_or(FulfillmentError::NotConfigured)?;
    let report = CatalogSync::new(state.pool(), printful).run().await?;
    Ok(ok(report))
}
