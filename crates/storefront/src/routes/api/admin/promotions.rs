//! Admin promotion management.

use axum::{extract::State, response::IntoResponse};
use tracing::{info, instrument};

use inkdrop_core::PromotionId;

use crate::db::PromotionRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::PromotionInput;
use crate::routes::api::extract::{Json, Path};
use crate::routes::api::ok;
use crate::state::AppState;

/// `GET /api/admin/promotions`
#[instrument(skip_all)]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(PromotionRepository::new(state.pool()).list().await?))
}

/// `GET /api/admin/promotions/{id}`
#[instrument(skip_all, fields(promotion_id = id))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let promotion = PromotionRepository::new(state.pool())
        .get_by_id(PromotionId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))?;
    Ok(ok(promotion))
}

/// `POST /api/admin/promotions`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(input): Json<PromotionInput>,
) -> Result<impl IntoResponse> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let promotion = PromotionRepository::new(state.pool()).create(&input).await?;
    info!(promotion_id = %promotion.id, "Promotion created");
    Ok(ok(promotion))
}

/// `PUT /api/admin/promotions/{id}`
#[instrument(skip_all, fields(admin_id = %admin.id, promotion_id = id))]
pub async fn update(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<PromotionInput>,
) -> Result<impl IntoResponse> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let promotion = PromotionRepository::new(state.pool())
        .update(PromotionId::new(id), &input)
        .await?;
    Ok(ok(promotion))
}

/// `DELETE /api/admin/promotions/{id}`
#[instrument(skip_all, fields(admin_id = %admin.id, promotion_id = id))]
pub async fn delete(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    PromotionRepository::new(state.pool())
        .delete(PromotionId::new(id))
        .await?;
    info!("Promotion deleted");
    Ok(ok(()))
}
