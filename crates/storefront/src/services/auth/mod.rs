//! Admin authentication service.
//!
//! Password login with argon2 hashes and attempt-based lockout.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use inkdrop_core::lockout::LockoutPolicy;
use inkdrop_core::{AdminId, AdminRole, Email};

use crate::db::{AdminRepository, RepositoryError};
use crate::models::{Admin, NewAdminInput};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Authentication service.
///
/// Handles admin login, lockout bookkeeping and account creation.
pub struct AuthService<'a> {
    admins: AdminRepository<'a>,
    policy: LockoutPolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: LockoutPolicy) -> Self {
        Self {
            admins: AdminRepository::new(pool),
            policy,
        }
    }

    /// Login with email and password.
    ///
    /// Locked accounts are rejected before the password is checked. Each
    /// failure is counted; a success resets the counter.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountLocked` while a lock is in effect.
    pub async fn login(&self, email: &str, password: &str) -> Result<Admin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let now = Utc::now();

        let (admin, password_hash) = self
            .admins
            .get_credentials_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let attempts = admin.login_attempts();
        if self.policy.is_locked(&attempts, now) {
            warn!(admin_id = %admin.id, "Login attempt on locked admin account");
            return Err(AuthError::AccountLocked {
                until: attempts.locked_until.unwrap_or(now),
            });
        }

        if verify_password(password, &password_hash).is_err() {
            let next = self.policy.record_failure(&attempts, now);
            self.admins.record_attempts(admin.id, next).await?;
            if let Some(until) = next.locked_until {
                warn!(admin_id = %admin.id, %until, "Admin account locked after failed logins");
                return Err(AuthError::AccountLocked { until });
            }
            return Err(AuthError::InvalidCredentials);
        }

        self.admins.record_login(admin.id).await?;
        info!(admin_id = %admin.id, "Admin logged in");

        let reset = self.policy.record_success();
        Ok(Admin {
            failed_login_attempts: reset.failed_attempts,
            locked_until: reset.locked_until,
            last_login_at: Some(now),
            ..admin
        })
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AdminAlreadyExists` if the email is already registered.
    pub async fn create_admin(&self, input: &NewAdminInput) -> Result<Admin, AuthError> {
        let email = Email::parse(&input.email)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        validate_password(&input.password)?;
        let password_hash = hash_password(&input.password)?;

        self.admins
            .create(&email, name, &password_hash, input.role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AdminAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Replace an admin's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AdminNotFound` if the admin does not exist.
    pub async fn set_password(&self, id: AdminId, password: &str) -> Result<(), AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        self.admins
            .set_password(id, &password_hash)
            .await
            .map_err(not_found_as_admin)
    }

    /// Clear a lockout.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AdminNotFound` if the admin does not exist.
    pub async fn unlock(&self, id: AdminId) -> Result<(), AuthError> {
        self.admins.unlock(id).await.map_err(not_found_as_admin)
    }

    /// Load an admin by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AdminNotFound` if the admin does not exist.
    pub async fn get_admin(&self, id: AdminId) -> Result<Admin, AuthError> {
        self.admins
            .get_by_id(id)
            .await?
            .ok_or(AuthError::AdminNotFound)
    }

    /// All admins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn list_admins(&self) -> Result<Vec<Admin>, AuthError> {
        Ok(self.admins.list().await?)
    }

    /// Whether `role` can be granted by an admin with `granter` role.
    #[must_use]
    pub const fn can_grant(granter: AdminRole, role: AdminRole) -> bool {
        match granter {
            AdminRole::SuperAdmin => true,
            AdminRole::Admin => matches!(role, AdminRole::Admin | AdminRole::Viewer),
            AdminRole::Viewer => false,
        }
    }
}

fn not_found_as_admin(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::NotFound => AuthError::AdminNotFound,
        other => AuthError::Repository(other),
    }
}

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.trim().is_empty() {
        return Err(AuthError::WeakPassword(
            "password cannot be only whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse battery", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("            ").is_err());
        assert!(validate_password("long enough pass").is_ok());
    }

    #[test]
    fn test_role_granting() {
        assert!(AuthService::can_grant(AdminRole::SuperAdmin, AdminRole::SuperAdmin));
        assert!(!AuthService::can_grant(AdminRole::Admin, AdminRole::SuperAdmin));
        assert!(AuthService::can_grant(AdminRole::Admin, AdminRole::Viewer));
        assert!(!AuthService::can_grant(AdminRole::Viewer, AdminRole::Viewer));
    }
}
