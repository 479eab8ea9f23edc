//! Promotion repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use inkdrop_core::promotion::PromotionRule;
use inkdrop_core::{ProductCategory, ProductId, PromotionId};

use super::{RepositoryError, parse_column};
use crate::models::promotion::normalize_code;
use crate::models::{Promotion, PromotionInput};

const PROMOTION_COLUMNS: &str = "id, name, code, auto_apply, kind, value, scope, product_ids, \
     categories, min_purchase, max_discount, usage_limit, usage_count, starts_at, ends_at, \
     is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PromotionRow {
    id: i32,
    name: String,
    code: Option<String>,
    auto_apply: bool,
    kind: String,
    value: Decimal,
    scope: String,
    product_ids: Json<Vec<ProductId>>,
    categories: Json<Vec<ProductCategory>>,
    min_purchase: Option<Decimal>,
    max_discount: Option<Decimal>,
    usage_limit: Option<i32>,
    usage_count: i32,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = RepositoryError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PromotionId::new(row.id),
            name: row.name,
            code: row.code,
            auto_apply: row.auto_apply,
            rule: PromotionRule {
                kind: parse_column(&row.kind, "kind")?,
                value: row.value,
                scope: parse_column(&row.scope, "scope")?,
                product_ids: row.product_ids.0,
                categories: row.categories.0,
                min_purchase: row.min_purchase,
                max_discount: row.max_discount,
                usage_limit: row.usage_limit,
                usage_count: row.usage_count,
                starts_at: row.starts_at,
                ends_at: row.ends_at,
                is_active: row.is_active,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for promotion database operations.
pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    /// Create a new promotion repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All promotions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Promotion::try_from).collect()
    }

    /// Get a promotion by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PromotionId) -> Result<Option<Promotion>, RepositoryError> {
        let row: Option<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Promotion::try_from).transpose()
    }

    /// Get a promotion by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Promotion>, RepositoryError> {
        let row: Option<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE code = $1"
        ))
        .bind(normalize_code(code))
        .fetch_optional(self.pool)
        .await?;

        row.map(Promotion::try_from).transpose()
    }

    /// Active auto-apply promotions inside their date window.
    ///
    /// Usage limits and cart conditions are evaluated by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_automatic(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions \
             WHERE auto_apply AND is_active \
             AND (starts_at IS NULL OR starts_at <= NOW()) \
             AND (ends_at IS NULL OR ends_at > NOW()) \
             ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Promotion::try_from).collect()
    }

    /// Create a promotion from normalized input.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, input: &PromotionInput) -> Result<Promotion, RepositoryError> {
        let row: PromotionRow = sqlx::query_as(&format!(
            "INSERT INTO promotions (name, code, auto_apply, kind, value, scope, product_ids, \
             categories, min_purchase, max_discount, usage_limit, starts_at, ends_at, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.auto_apply)
        .bind(input.kind.as_str())
        .bind(input.value)
        .bind(input.scope.as_str())
        .bind(Json(&input.product_ids))
        .bind(Json(&input.categories))
        .bind(input.min_purchase)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "promotion code"))?;

        Promotion::try_from(row)
    }

    /// Replace a promotion's rule fields. The usage count is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion does not exist.
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn update(
        &self,
        id: PromotionId,
        input: &PromotionInput,
    ) -> Result<Promotion, RepositoryError> {
        let row: Option<PromotionRow> = sqlx::query_as(&format!(
            "UPDATE promotions SET name = $2, code = $3, auto_apply = $4, kind = $5, value = $6, \
             scope = $7, product_ids = $8, categories = $9, min_purchase = $10, \
             max_discount = $11, usage_limit = $12, starts_at = $13, ends_at = $14, \
             is_active = $15, updated_at = NOW() \
             WHERE id = $1 RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.auto_apply)
        .bind(input.kind.as_str())
        .bind(input.value)
        .bind(input.scope.as_str())
        .bind(Json(&input.product_ids))
        .bind(Json(&input.categories))
        .bind(input.min_purchase)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "promotion code"))?;

        row.map(Promotion::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a promotion. Orders keep the code they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion does not exist.
    pub async fn delete(&self, id: PromotionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count one redemption, unless the usage limit is already reached.
    ///
    /// Returns `false` when the limit blocked the increment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_usage(&self, id: PromotionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE promotions SET usage_count = usage_count + 1, updated_at = NOW() \
             WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
