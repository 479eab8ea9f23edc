//! Authentication error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication and account management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] inkdrop_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts; login refused until the lock expires.
    #[error("account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    /// Admin not found.
    #[error("admin not found")]
    AdminNotFound,

    /// Email already registered.
    #[error("admin already exists")]
    AdminAlreadyExists,

    /// Display name left blank.
    #[error("name is required")]
    MissingName,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
