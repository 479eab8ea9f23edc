//! Admin account repository.
//!
//! Password hashes never leave this module except through
//! [`AdminRepository::get_credentials_by_email`], which is only used by login.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use inkdrop_core::lockout::LoginAttempts;
use inkdrop_core::{AdminId, AdminRole, Email};

use super::{RepositoryError, parse_column};
use crate::models::Admin;

// =============================================================================
// Internal Row Types
// =============================================================================

const ADMIN_COLUMNS: &str =
    "id, email, name, role, failed_login_attempts, locked_until, last_login_at, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    email: String,
    name: String,
    role: String,
    failed_login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            name: row.name,
            role: parse_column(&row.role, "role")?,
            failed_login_attempts: row.failed_login_attempts,
            locked_until: row.locked_until,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    admin: AdminRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin account database operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        let row: Option<AdminRow> =
            sqlx::query_as(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(Admin::try_from).transpose()
    }

    /// Get an admin and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(Admin, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM admins WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((Admin::try_from(r.admin)?, r.password_hash)))
            .transpose()
    }

    /// All admins, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows: Vec<AdminRow> =
            sqlx::query_as(&format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(Admin::try_from).collect()
    }

    /// Number of admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Create an admin with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        let row: AdminRow = sqlx::query_as(&format!(
            "INSERT INTO admins (email, name, password_hash, role) VALUES ($1, $2, $3, $4) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "admin email"))?;

        Admin::try_from(row)
    }

    /// Replace an admin's password hash and clear any lockout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn set_password(&self, id: AdminId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admins SET password_hash = $2, failed_login_attempts = 0, locked_until = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the lockout counters produced by a failed login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_attempts(
        &self,
        id: AdminId,
        attempts: LoginAttempts,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE admins SET failed_login_attempts = $2, locked_until = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(attempts.failed_attempts)
        .bind(attempts.locked_until)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Reset lockout counters and stamp the login time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_login(&self, id: AdminId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE admins SET failed_login_attempts = 0, locked_until = NULL, \
             last_login_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Clear a lockout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn unlock(&self, id: AdminId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admins SET failed_login_attempts = 0, locked_until = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn delete(&self, id: AdminId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
