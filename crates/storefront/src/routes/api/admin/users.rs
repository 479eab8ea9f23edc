//! Admin user management (super admins only).

use axum::{extract::State, response::IntoResponse};
use tracing::{info, instrument};

use inkdrop_core::AdminId;

use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::models::NewAdminInput;
use crate::routes::api::extract::{Json, Path};
use crate::routes::api::ok;
use crate::services::auth::AuthService;
use crate::state::AppState;

fn auth(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.config().admin_lockout)
}

/// `GET /api/admin/users`
#[instrument(skip_all)]
pub async fn list(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(auth(&state).list_admins().await?))
}

/// `POST /api/admin/users`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewAdminInput>,
) -> Result<impl IntoResponse> {
    if !AuthService::can_grant(admin.role, input.role) {
        return Err(AppError::Forbidden(format!("Cannot grant the {} role", input.role)));
    }
    let created = auth(&state).create_admin(&input).await?;
    info!(new_admin_id = %created.id, role = %created.role, "Admin created");
    Ok(ok(created))
}

/// `POST /api/admin/users/{id}/unlock`
#[instrument(skip_all, fields(admin_id = %admin.id, target_id = id))]
pub async fn unlock(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let service = auth(&state);
    service.unlock(AdminId::new(id)).await?;
    Ok(ok(service.get_admin(AdminId::new(id)).await?))
}
