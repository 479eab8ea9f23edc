//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use inkdrop_core::{ProductCategory, ProductId};

use super::{Page, Pagination, RepositoryError, parse_column};
use crate::models::{CategorySummary, Product, ProductInput, ProductVariant};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, compare_at_price, images, \
     category, variants, is_active, is_featured, sort_order, printful_product_id, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    images: Json<Vec<String>>,
    category: String,
    variants: Json<Vec<ProductVariant>>,
    is_active: bool,
    is_featured: bool,
    sort_order: i32,
    printful_product_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            compare_at_price: row.compare_at_price,
            images: row.images.0,
            category: parse_column::<ProductCategory>(&row.category, "category")?,
            variants: row.variants.0,
            is_active: row.is_active,
            is_featured: row.is_featured,
            sort_order: row.sort_order,
            printful_product_id: row.printful_product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Featured first, then the manual sort key, then newest.
    #[default]
    Featured,
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Featured => " ORDER BY is_featured DESC, sort_order ASC, created_at DESC, id DESC",
            Self::Newest => " ORDER BY created_at DESC, id DESC",
            Self::PriceAsc => " ORDER BY price ASC, id ASC",
            Self::PriceDesc => " ORDER BY price DESC, id DESC",
            Self::Name => " ORDER BY name ASC, id ASC",
        }
    }

    /// Query-string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub size: Option<String>,
    pub search: Option<String>,
    /// Include inactive products (admin listings).
    pub include_inactive: bool,
    pub sort: ProductSort,
}

impl ProductFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if !self.include_inactive {
            qb.push(" AND is_active");
        }
        if let Some(category) = self.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(size) = self.size.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND EXISTS (SELECT 1 FROM jsonb_array_elements(variants) v WHERE lower(v->>'size') = lower(")
                .push_bind(size.to_string())
                .push("))");
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        filter.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        filter.push_where(&mut qb);
        qb.push(filter.sort.order_by());
        qb.push(" LIMIT ")
            .push_bind(pagination.limit_i64())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, pagination.page, pagination.limit, total))
    }

    /// Active featured products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active AND is_featured \
             ORDER BY sort_order ASC, created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by slug, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get a product by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get several products at once, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get the product linked to a Printful sync product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_printful_id(
        &self,
        printful_product_id: i64,
    ) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE printful_product_id = $1"
        ))
        .bind(printful_product_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Active product counts per category.
    ///
    /// Every category is returned, including empty ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_counts(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM products WHERE is_active GROUP BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ProductCategory::ALL
            .iter()
            .map(|category| CategorySummary {
                slug: category.as_str(),
                label: category.label(),
                product_count: rows
                    .iter()
                    .find(|(c, _)| c == category.as_str())
                    .map_or(0, |(_, n)| *n),
            })
            .collect())
    }

    /// Count active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count active products with at least one variant at or below `threshold` stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self, threshold: i32) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active AND EXISTS \
             (SELECT 1 FROM jsonb_array_elements(variants) v WHERE (v->>'stock')::int <= $1)",
        )
        .bind(threshold)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Create a product.
    ///
    /// `input` must already be normalized so the slug is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or Printful id is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (name, slug, description, price, compare_at_price, images, \
             category, variants, is_active, is_featured, sort_order, printful_product_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.slug.as_deref().unwrap_or_default())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.compare_at_price)
        .bind(Json(&input.images))
        .bind(input.category.as_str())
        .bind(Json(&input.variants))
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.sort_order)
        .bind(input.printful_product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product"))?;

        Product::try_from(row)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, \
             compare_at_price = $6, images = $7, category = $8, variants = $9, is_active = $10, \
             is_featured = $11, sort_order = $12, printful_product_id = $13, updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(input.slug.as_deref().unwrap_or_default())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.compare_at_price)
        .bind(Json(&input.images))
        .bind(input.category.as_str())
        .bind(Json(&input.variants))
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.sort_order)
        .bind(input.printful_product_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product"))?;

        row.map(Product::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Soft-disable a product.
    ///
    /// Orders keep their own snapshot, so products are never hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, is_featured = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a slug is used by a product other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_taken(
        &self,
        slug: &str,
        except: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("owl"), "owl");
    }

    #[test]
    fn test_filter_sql_includes_only_set_filters() {
        let filter = ProductFilter {
            category: Some(ProductCategory::Mugs),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products");
        filter.push_where(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("is_active"));
        assert!(sql.contains("category = $1"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn test_sort_parses_from_query_string() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap_or_default();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert_eq!(sort.as_str(), "price_desc");
    }
}
