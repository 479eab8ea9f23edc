//! Admin authentication extractors.
//!
//! Admin identity lives in the session as a [`CurrentAdmin`]. API requests
//! without it get a JSON 401; page requests are redirected to the login page.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use inkdrop_core::AdminRole;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};

/// Login page for the admin back office.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Extractor that requires a logged-in admin of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor that requires an admin allowed to make changes (not `viewer`).
pub struct RequireAdminWrite(pub CurrentAdmin);

/// Extractor that requires a `super_admin`.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Error returned when an admin is required but missing or under-privileged.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Logged in, but the role does not allow this.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(ADMIN_LOGIN_PATH).into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("Your role does not allow this action".to_string())
                    .into_response()
            }
        }
    }
}

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AuthRejection> {
    // Nested routers see a stripped path; the original one tells API from pages.
    let is_api = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.path())
        .starts_with("/api/");
    let missing = || {
        if is_api {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    };

    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts.extensions.get::<Session>().ok_or_else(missing)?;

    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or_else(missing)
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdminWrite
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.role.can_write() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(admin))
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if admin.role != AdminRole::SuperAdmin {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is cycled first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}
