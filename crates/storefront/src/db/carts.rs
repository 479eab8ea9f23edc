//! Cart repository.
//!
//! A cart is a single row keyed by the random token stored in the visitor's
//! session. Line items live in a JSONB column and the row expires
//! [`CART_TTL_DAYS`](inkdrop_core::cart::CART_TTL_DAYS) after its last write.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use inkdrop_core::cart::{CartLine, expiry_from};

use super::RepositoryError;

/// A stored cart.
#[derive(Debug, Clone)]
pub struct StoredCart {
    pub token: Uuid,
    pub lines: Vec<CartLine>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartRow {
    token: Uuid,
    items: Json<Vec<CartLine>>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for StoredCart {
    fn from(row: CartRow) -> Self {
        Self {
            token: row.token,
            lines: row.items.0,
            expires_at: row.expires_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an unexpired cart by token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, token: Uuid) -> Result<Option<StoredCart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(
            "SELECT token, items, expires_at, updated_at FROM carts \
             WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(StoredCart::from))
    }

    /// Insert or replace a cart, pushing its expiry forward.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, token: Uuid, lines: &[CartLine]) -> Result<StoredCart, RepositoryError> {
        let now = Utc::now();
        let row: CartRow = sqlx::query_as(
            "INSERT INTO carts (token, items, expires_at, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (token) DO UPDATE SET items = EXCLUDED.items, \
             expires_at = EXCLUDED.expires_at, updated_at = EXCLUDED.updated_at \
             RETURNING token, items, expires_at, updated_at",
        )
        .bind(token)
        .bind(Json(lines))
        .bind(expiry_from(now))
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, token: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete every expired cart, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn prune_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
