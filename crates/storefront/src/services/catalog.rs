//! Public catalog reads.
//!
//! Everything here only ever returns active products.

use sqlx::PgPool;

use crate::db::{Page, Pagination, ProductFilter, ProductRepository, RepositoryError};
use crate::models::{CategorySummary, Product};

/// Default number of featured products on the home page.
pub const FEATURED_LIMIT: i64 = 8;

/// Maximum number of search results.
pub const SEARCH_LIMIT: u32 = 24;

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Browse active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn browse(
        &self,
        mut filter: ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, RepositoryError> {
        filter.include_inactive = false;
        self.products.list(&filter, pagination).await
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.products.featured(limit).await
    }

    /// Active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn product(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .get_by_slug(slug)
            .await?
            .filter(|p| p.is_active))
    }

    /// Every category with its active product count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        self.products.category_counts().await
    }

    /// Name/description search. Blank queries return nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let filter = ProductFilter {
            search: Some(query.to_string()),
            ..ProductFilter::default()
        };
        let page = self
            .products
            .list(&filter, Pagination::new(Some(1), Some(SEARCH_LIMIT)))
            .await?;
        Ok(page.items)
    }
}
