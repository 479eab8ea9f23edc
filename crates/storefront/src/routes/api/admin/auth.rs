//! Admin login, logout and identity.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::api::extract::Json;
use crate::routes::api::ok;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/admin/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let admin = AuthService::new(state.pool(), state.config().admin_lockout)
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| warn!(error = %e, "Admin login failed"))?;

    let current = CurrentAdmin {
        id: admin.id,
        email: admin.email.clone(),
        name: admin.name.clone(),
        role: admin.role,
    };
    set_current_admin(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    info!(admin_id = %admin.id, "Admin logged in");

    Ok(ok(current))
}

/// `POST /api/admin/auth/logout`
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    clear_sentry_user();
    Ok(ok(()))
}

/// `GET /api/admin/auth/me`
pub async fn me(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
    ok(admin)
}
