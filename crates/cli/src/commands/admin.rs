//! Admin user management commands.
//!
//! ```bash
//! inkdrop admin create -e admin@example.com -n "Admin Name" -r super_admin
//! ```
//!
//! The first account has to come from here; after that super admins can
//! create accounts through the admin API.

use sqlx::PgPool;
use thiserror::Error;

use inkdrop_core::AdminRole;
use inkdrop_core::lockout::LockoutPolicy;
use inkdrop_storefront::models::NewAdminInput;
use inkdrop_storefront::services::auth::{AuthError, AuthService};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Validation or database failure while creating the account.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin`, `admin`, or `viewer`)
/// * `password` - Initial password, hashed before it is stored
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    role: &str,
    password: String,
) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    tracing::info!("Creating admin user: {} ({})", email, role);

    let admin = AuthService::new(pool, LockoutPolicy::default())
        .create_admin(&NewAdminInput {
            email: email.to_owned(),
            name: name.to_owned(),
            password,
            role,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );

    Ok(admin.id.as_i32())
}
