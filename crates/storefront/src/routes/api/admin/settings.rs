//! Admin store settings.

use axum::{extract::State, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::settings::SettingsUpdate;
use crate::routes::api::extract::Json;
use crate::routes::api::ok;
use crate::services::settings::SettingsService;
use crate::state::AppState;

/// `GET /api/admin/settings`
#[instrument(skip_all)]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(SettingsService::new(&state).get().await?))
}

/// `PUT /api/admin/settings`
///
/// Only the fields present in the body change.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<impl IntoResponse> {
    let service = SettingsService::new(&state);
    let current = service.get().await?;
    let next = update.apply(&current).map_err(AppError::BadRequest)?;
    service.save(&next).await?;
    info!("Store settings updated");
    Ok(ok(next))
}
