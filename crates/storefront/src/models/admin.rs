//! Admin account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkdrop_core::lockout::LoginAttempts;
use inkdrop_core::{AdminId, AdminRole, Email};

/// A back-office account (domain type).
///
/// The password hash is kept out of this type; it is only read during login.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Current lockout counters.
    #[must_use]
    pub const fn login_attempts(&self) -> LoginAttempts {
        LoginAttempts {
            failed_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
        }
    }
}

/// Fields accepted when creating an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAdminInput {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: AdminRole,
}
