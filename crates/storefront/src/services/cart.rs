//! Cart service.
//!
//! Carts are keyed by the token held in the visitor's session. Every mutation
//! reloads the stored lines, applies the change with the pure functions in
//! [`inkdrop_core::cart`], checks stock against the current catalog and writes
//! the lines back, which also pushes the expiry out by another 30 days.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use inkdrop_core::ProductId;
use inkdrop_core::cart::{self, CartError, CartLine};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{Product, ProductVariant};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// A cart rule was violated.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The product does not exist or is no longer sold.
    #[error("product not found")]
    ProductNotFound,

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Body of `POST /api/cart/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Cart as returned to the browser, with derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Decimal,
}

impl CartView {
    #[must_use]
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        Self {
            item_count: cart::item_count(&items),
            subtotal: cart::subtotal(&items),
            items,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Lines of the cart for `token`; empty when there is no live cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn lines(&self, token: Option<Uuid>) -> Result<Vec<CartLine>, RepositoryError> {
        let Some(token) = token else {
            return Ok(Vec::new());
        };
        Ok(self
            .carts
            .get(token)
            .await?
            .map(|stored| stored.lines)
            .unwrap_or_default())
    }

    /// Add a product to the cart, merging with an existing line for the same
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for unknown or inactive
    /// products, `CartError::VariantNotFound` when the selection does not
    /// match a variant, and `CartError::InsufficientStock` when the cart would
    /// hold more units than are in stock.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_item(
        &self,
        token: Uuid,
        request: &AddToCart,
    ) -> Result<Vec<CartLine>, CartServiceError> {
        cart::check_quantity(request.quantity)?;

        let product = self
            .products
            .get_by_id(request.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartServiceError::ProductNotFound)?;

        let mut lines = self.lines(Some(token)).await?;
        let line = new_line(&product, request, &lines)?;
        cart::add_line(&mut lines, line)?;

        self.carts.save(token, &lines).await?;
        debug!(lines = lines.len(), "Cart updated");
        Ok(lines)
    }

    /// Change a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound`, `CartError::InvalidQuantity` or
    /// `CartError::InsufficientStock`.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        token: Uuid,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartServiceError> {
        if quantity == 0 {
            return self.remove_item(token, line_id).await;
        }
        cart::check_quantity(quantity)?;

        let mut lines = self.lines(Some(token)).await?;
        let line = lines
            .iter()
            .find(|l| l.id == line_id)
            .ok_or(CartError::LineNotFound)?;

        if let Some(product) = self.products.get_by_id(line.product_id).await? {
            let variant = product.find_variant(
                line.variant.size.as_deref(),
                line.variant.color.as_deref(),
            );
            if let Some(variant) = variant {
                let elsewhere = cart::quantity_in_cart(&lines, line.product_id, &line.variant)
                    - line.quantity;
                cart::ensure_stock(variant.stock, elsewhere + quantity)?;
            }
        }

        cart::set_quantity(&mut lines, line_id, quantity)?;
        self.carts.save(token, &lines).await?;
        Ok(lines)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line is not in the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        token: Uuid,
        line_id: Uuid,
    ) -> Result<Vec<CartLine>, CartServiceError> {
        let mut lines = self.lines(Some(token)).await?;
        cart::remove_line(&mut lines, line_id)?;
        self.carts.save(token, &lines).await?;
        Ok(lines)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn clear(&self, token: Uuid) -> Result<(), RepositoryError> {
        self.carts.delete(token).await
    }
}

/// Build the line for an add-to-cart request.
///
/// Products without variants have no stock limit.
fn new_line(
    product: &Product,
    request: &AddToCart,
    lines: &[CartLine],
) -> Result<CartLine, CartError> {
    let variant: Option<&ProductVariant> = if product.variants.is_empty() {
        None
    } else {
        Some(
            product
                .find_variant(request.size.as_deref(), request.color.as_deref())
                .ok_or(CartError::VariantNotFound)?,
        )
    };

    let selection = variant.map(ProductVariant::selection).unwrap_or_default();
    if let Some(variant) = variant {
        let in_cart = cart::quantity_in_cart(lines, product.id, &selection);
        cart::ensure_stock(variant.stock, in_cart + request.quantity)?;
    }

    Ok(CartLine {
        id: Uuid::new_v4(),
        product_id: product.id,
        product_name: product.name.clone(),
        product_slug: product.slug.clone(),
        image: product.primary_image().map(str::to_string),
        category: product.category,
        variant: selection,
        provider_variant_id: variant.and_then(|v| v.printful_variant_id),
        quantity: request.quantity,
        unit_price: product.price_for(variant),
        added_at: Utc::now(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::{product, variant};

    fn request(size: Option<&str>, quantity: u32) -> AddToCart {
        AddToCart {
            product_id: ProductId::new(1),
            size: size.map(str::to_string),
            color: None,
            quantity,
        }
    }

    #[test]
    fn test_new_line_snapshots_price_and_variant() {
        let mut medium = variant("M", None, 10);
        medium.price = Some(Decimal::new(2800, 2));
        medium.printful_variant_id = Some(4011);
        let product = product(vec![variant("S", None, 10), medium]);

        let line = new_line(&product, &request(Some("m"), 2), &[]).unwrap();
        assert_eq!(line.unit_price, Decimal::new(2800, 2));
        assert_eq!(line.variant.size.as_deref(), Some("M"));
        assert_eq!(line.provider_variant_id, Some(4011));
        assert_eq!(line.product_slug, "inkblot-tee");
        assert_eq!(line.line_total(), Decimal::new(5600, 2));
    }

    #[test]
    fn test_new_line_rejects_unknown_variant() {
        let product = product(vec![variant("S", None, 10)]);
        assert_eq!(
            new_line(&product, &request(Some("XXL"), 1), &[]).unwrap_err(),
            CartError::VariantNotFound
        );
    }

    #[test]
    fn test_insufficient_stock_counts_units_already_in_cart() {
        let product = product(vec![variant("M", None, 3)]);
        let first = new_line(&product, &request(Some("M"), 2), &[]).unwrap();

        assert_eq!(
            new_line(&product, &request(Some("M"), 2), &[first]).unwrap_err(),
            CartError::InsufficientStock { available: 3 }
        );
    }

    #[test]
    fn test_product_without_variants_is_unlimited() {
        let product = product(Vec::new());
        let line = new_line(&product, &request(None, 50), &[]).unwrap();
        assert_eq!(line.quantity, 50);
        assert_eq!(line.unit_price, product.price);
    }

    #[test]
    fn test_cart_view_totals() {
        let product = product(Vec::new());
        let a = new_line(&product, &request(None, 2), &[]).unwrap();
        let view = CartView::from_lines(vec![a]);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, Decimal::new(5000, 2));
        assert!(!view.is_empty());
    }
}
