//! Import Printful sync products into the local catalog.
//!
//! Each sync product becomes one catalog product keyed by
//! `printful_product_id`. Names, prices, images and variants follow Printful;
//! merchandising fields (description, category, featured flag, sort order,
//! active flag) and per-variant stock are kept when the product already exists.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use inkdrop_core::ProductCategory;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{Product, ProductInput, ProductVariant};
use crate::printful::{PrintfulClient, PrintfulError, SyncProductDetail};

/// Stock given to newly imported variants.
pub const DEFAULT_SYNC_STOCK: i32 = 1000;

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Catalog sync job.
pub struct CatalogSync<'a> {
    products: ProductRepository<'a>,
    printful: &'a PrintfulClient,
}

impl<'a> CatalogSync<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, printful: &'a PrintfulClient) -> Self {
        Self {
            products: ProductRepository::new(pool),
            printful,
        }
    }

    /// Pull every sync product and create or update its catalog entry.
    ///
    /// A product that fails to import is counted and logged; the run goes on.
    ///
    /// # Errors
    ///
    /// Returns `PrintfulError` only if the product list itself cannot be
    /// fetched.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncReport, PrintfulError> {
        let summaries = self.printful.list_sync_products().await?;
        let mut report = SyncReport::default();

        for summary in summaries {
            if summary.is_ignored {
                report.skipped += 1;
                continue;
            }

            let detail = match self.printful.get_sync_product(summary.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(printful_product_id = summary.id, error = %e, "Failed to fetch sync product");
                    report.failed += 1;
                    continue;
                }
            };

            match self.import(&detail).await {
                Ok(Some(true)) => report.created += 1,
                Ok(Some(false)) => report.updated += 1,
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(printful_product_id = summary.id, error = %e, "Failed to import sync product");
                    report.failed += 1;
                }
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Catalog sync finished"
        );
        Ok(report)
    }

    /// Returns `Some(true)` when created, `Some(false)` when updated and
    /// `None` when the product has nothing sellable.
    async fn import(&self, detail: &SyncProductDetail) -> Result<Option<bool>, RepositoryError> {
        let printful_id = detail.sync_product.id;
        let existing = self.products.get_by_printful_id(printful_id).await?;

        let Some(input) = product_input(detail, existing.as_ref()) else {
            return Ok(None);
        };
        let Ok(mut input) = input.normalized() else {
            return Ok(None);
        };

        if let Some(product) = existing {
            self.products.update(product.id, &input).await?;
            return Ok(Some(false));
        }

        let slug = input.slug.clone().unwrap_or_default();
        if self.products.slug_taken(&slug, None).await? {
            input.slug = Some(format!("{slug}-{printful_id}"));
        }
        self.products.create(&input).await?;
        Ok(Some(true))
    }
}

/// Map a sync product onto catalog fields.
///
/// Returns `None` if no variant is sellable.
fn product_input(detail: &SyncProductDetail, existing: Option<&Product>) -> Option<ProductInput> {
    let variants: Vec<ProductVariant> = detail
        .sync_variants
        .iter()
        .filter(|v| !v.is_ignored)
        .map(|v| {
            let stock = existing
                .and_then(|p| {
                    p.variants
                        .iter()
                        .find(|pv| pv.printful_variant_id == Some(v.id))
                })
                .map_or(DEFAULT_SYNC_STOCK, |pv| pv.stock);
            ProductVariant {
                size: v.size.clone(),
                color: v.color.clone(),
                sku: v.sku.clone(),
                price: v.retail_price.as_deref().and_then(|p| Decimal::from_str(p).ok()),
                stock,
                printful_variant_id: Some(v.id),
                printful_catalog_variant_id: Some(v.variant_id),
            }
        })
        .collect();

    let price = variants.iter().filter_map(|v| v.price).min()?;

    let mut images: Vec<String> = Vec::new();
    let previews = detail
        .sync_variants
        .iter()
        .filter_map(|v| v.preview_url().map(str::to_string));
    for url in detail.sync_product.thumbnail_url.iter().cloned().chain(previews) {
        if !images.contains(&url) {
            images.push(url);
        }
    }

    let name = detail.sync_product.name.clone();
    Some(ProductInput {
        slug: existing.map(|p| p.slug.clone()),
        description: existing.map(|p| p.description.clone()).unwrap_or_default(),
        price,
        compare_at_price: existing.and_then(|p| p.compare_at_price),
        images,
        category: existing.map_or_else(|| ProductCategory::infer_from_name(&name), |p| p.category),
        variants,
        is_active: existing.is_none_or(|p| p.is_active),
        is_featured: existing.is_some_and(|p| p.is_featured),
        sort_order: existing.map_or(0, |p| p.sort_order),
        printful_product_id: Some(detail.sync_product.id),
        name,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::product;
    use crate::printful::{SyncFile, SyncProductSummary, SyncVariant};

    fn sync_variant(id: i64, size: &str, price: &str) -> SyncVariant {
        SyncVariant {
            id,
            variant_id: id + 9000,
            name: format!("Ink Hoodie / {size}"),
            retail_price: Some(price.to_string()),
            sku: Some(format!("INK-{size}")),
            size: Some(size.to_string()),
            color: Some("Black".to_string()),
            is_ignored: false,
            files: vec![SyncFile {
                file_type: "preview".to_string(),
                preview_url: Some(format!("https://files.example.test/{id}.png")),
            }],
        }
    }

    fn detail(variants: Vec<SyncVariant>) -> SyncProductDetail {
        SyncProductDetail {
            sync_product: SyncProductSummary {
                id: 55,
                external_id: None,
                name: "Ink Hoodie".to_string(),
                thumbnail_url: Some("https://files.example.test/thumb.png".to_string()),
                is_ignored: false,
            },
            sync_variants: variants,
        }
    }

    #[test]
    fn test_new_product_from_sync() {
        let input = product_input(
            &detail(vec![sync_variant(1, "M", "45.00"), sync_variant(2, "XL", "48.00")]),
            None,
        )
        .unwrap();

        assert_eq!(input.name, "Ink Hoodie");
        assert_eq!(input.price, Decimal::new(4500, 2));
        assert_eq!(input.category, ProductCategory::Hoodies);
        assert_eq!(input.variants.len(), 2);
        assert_eq!(input.variants[0].stock, DEFAULT_SYNC_STOCK);
        assert_eq!(input.variants[0].printful_catalog_variant_id, Some(9001));
        assert_eq!(input.images.len(), 3);
        assert!(input.is_active);
        assert_eq!(input.printful_product_id, Some(55));
    }

    #[test]
    fn test_existing_merchandising_is_kept() {
        let mut existing = product(Vec::new());
        existing.description = "Heavyweight fleece.".to_string();
        existing.is_featured = true;
        existing.variants = vec![ProductVariant {
            size: Some("M".to_string()),
            color: Some("Black".to_string()),
            sku: None,
            price: None,
            stock: 4,
            printful_variant_id: Some(1),
            printful_catalog_variant_id: Some(9001),
        }];

        let input = product_input(&detail(vec![sync_variant(1, "M", "45.00")]), Some(&existing))
            .unwrap();
        assert_eq!(input.description, "Heavyweight fleece.");
        assert_eq!(input.category, existing.category);
        assert_eq!(input.slug.as_deref(), Some("inkblot-tee"));
        assert!(input.is_featured);
        assert_eq!(input.variants[0].stock, 4);
    }

    #[test]
    fn test_nothing_sellable_is_skipped() {
        let mut ignored = sync_variant(1, "M", "45.00");
        ignored.is_ignored = true;
        assert!(product_input(&detail(vec![ignored]), None).is_none());
        assert!(product_input(&detail(Vec::new()), None).is_none());
    }
}
