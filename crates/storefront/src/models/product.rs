//! Catalog product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkdrop_core::cart::VariantSelection;
use inkdrop_core::{ProductCategory, ProductId};

/// A sellable variant of a product (size/color combination).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    /// Price override; the product price applies when absent.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    /// Printful sync variant id, used when submitting orders.
    #[serde(default)]
    pub printful_variant_id: Option<i64>,
    /// Printful catalog variant id, used for shipping quotes.
    #[serde(default)]
    pub printful_catalog_variant_id: Option<i64>,
}

impl ProductVariant {
    /// Whether this variant matches a requested size and color.
    ///
    /// Comparison is case-insensitive and a missing value only matches a
    /// missing value.
    #[must_use]
    pub fn matches(&self, size: Option<&str>, color: Option<&str>) -> bool {
        fn same(a: Option<&str>, b: Option<&str>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b.trim()),
                _ => false,
            }
        }
        same(self.size.as_deref(), size) && same(self.color.as_deref(), color)
    }

    /// The customer-facing selection for this variant.
    #[must_use]
    pub fn selection(&self) -> VariantSelection {
        VariantSelection {
            size: self.size.clone(),
            color: self.color.clone(),
            sku: self.sku.clone(),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub images: Vec<String>,
    pub category: ProductCategory,
    pub variants: Vec<ProductVariant>,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub printful_product_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First image, used as the thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Find the variant for a size/color selection.
    #[must_use]
    pub fn find_variant(&self, size: Option<&str>, color: Option<&str>) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.matches(size, color))
    }

    /// Price of a variant, falling back to the product price.
    #[must_use]
    pub fn price_for(&self, variant: Option<&ProductVariant>) -> Decimal {
        variant.and_then(|v| v.price).unwrap_or(self.price)
    }

    /// Distinct sizes across variants, in catalog order.
    #[must_use]
    pub fn sizes(&self) -> Vec<&str> {
        let mut sizes: Vec<&str> = Vec::new();
        for size in self.variants.iter().filter_map(|v| v.size.as_deref()) {
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
        sizes
    }

    /// Distinct colors across variants, in catalog order.
    #[must_use]
    pub fn colors(&self) -> Vec<&str> {
        let mut colors: Vec<&str> = Vec::new();
        for color in self.variants.iter().filter_map(|v| v.color.as_deref()) {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
        colors
    }

    /// Whether any variant has stock (products without variants are always in stock).
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v.stock > 0)
    }
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub printful_product_id: Option<i64>,
}

const fn default_true() -> bool {
    true
}

impl ProductInput {
    /// Validate and fill in the slug.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("Product name is required".to_string());
        }
        if self.price < Decimal::ZERO {
            return Err("Price cannot be negative".to_string());
        }
        if self.compare_at_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err("Compare-at price cannot be negative".to_string());
        }
        if self.variants.iter().any(|v| v.stock < 0) {
            return Err("Variant stock cannot be negative".to_string());
        }

        let slug = self
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&self.name));
        if slug.is_empty() {
            return Err("Product slug is required".to_string());
        }
        self.slug = Some(slug);
        Ok(self)
    }
}

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Category with the number of active products in it.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub slug: &'static str,
    pub label: &'static str,
    pub product_count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub fn variant(size: &str, color: Option<&str>, stock: i32) -> ProductVariant {
        ProductVariant {
            size: Some(size.to_string()),
            color: color.map(str::to_string),
            sku: Some(format!("SKU-{size}")),
            price: None,
            stock,
            printful_variant_id: None,
            printful_catalog_variant_id: None,
        }
    }

    pub fn product(variants: Vec<ProductVariant>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Inkblot Tee".to_string(),
            slug: "inkblot-tee".to_string(),
            description: String::new(),
            price: Decimal::new(2500, 2),
            compare_at_price: None,
            images: vec!["https://cdn.example.test/tee.png".to_string()],
            category: ProductCategory::Shirts,
            variants,
            is_active: true,
            is_featured: false,
            sort_order: 0,
            printful_product_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Inkblot Tee (Black)"), "inkblot-tee-black");
        assert_eq!(slugify("  --Hello__World--  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_find_variant_is_case_insensitive_and_strict() {
        let p = product(vec![
            variant("M", Some("Black"), 3),
            variant("L", Some("Black"), 0),
        ]);
        assert!(p.find_variant(Some("m"), Some("black")).is_some());
        assert!(p.find_variant(Some("M"), None).is_none());
        assert!(p.find_variant(Some("XL"), Some("Black")).is_none());
    }

    #[test]
    fn test_sizes_are_distinct_in_order() {
        let p = product(vec![
            variant("S", Some("Black"), 1),
            variant("M", Some("Black"), 1),
            variant("S", Some("White"), 1),
        ]);
        assert_eq!(p.sizes(), vec!["S", "M"]);
        assert_eq!(p.colors(), vec!["Black", "White"]);
    }

    #[test]
    fn test_price_override() {
        let mut v = variant("XL", None, 1);
        let p = product(vec![]);
        assert_eq!(p.price_for(Some(&v)), Decimal::new(2500, 2));
        v.price = Some(Decimal::new(2800, 2));
        assert_eq!(p.price_for(Some(&v)), Decimal::new(2800, 2));
    }

    #[test]
    fn test_input_normalization() {
        let input = ProductInput {
            name: "  Night Owl Hoodie ".to_string(),
            slug: None,
            description: String::new(),
            price: Decimal::new(4500, 2),
            compare_at_price: None,
            images: vec![],
            category: ProductCategory::Hoodies,
            variants: vec![],
            is_active: true,
            is_featured: false,
            sort_order: 0,
            printful_product_id: None,
        };
        let normalized = input.clone().normalized().unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("night-owl-hoodie"));

        let negative = ProductInput {
            price: Decimal::new(-1, 0),
            ..input
        };
        assert!(negative.normalized().is_err());
    }
}
