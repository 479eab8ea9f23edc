//! Cart lines and subtotal math.
//!
//! A cart is a list of [`CartLine`]s. The subtotal is always derived from the
//! lines, never stored.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ProductCategory, ProductId};

/// Days of inactivity after which a cart expires.
pub const CART_TTL_DAYS: i64 = 30;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity outside `1..=MAX_LINE_QUANTITY`.
    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,
    /// The referenced line is not in the cart.
    #[error("cart item not found")]
    LineNotFound,
    /// Not enough stock to satisfy the requested quantity.
    #[error("insufficient stock: only {available} available")]
    InsufficientStock {
        /// Units currently in stock.
        available: u32,
    },
    /// The requested variant does not exist on the product.
    #[error("selected variant is not available")]
    VariantNotFound,
}

/// The variant a customer picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl VariantSelection {
    /// Short label such as `"M / Black"`.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        let parts: Vec<&str> = [self.size.as_deref(), self.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" / "))
    }
}

/// One line in a cart, with the price captured when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    #[serde(default)]
    pub image: Option<String>,
    pub category: ProductCategory,
    pub variant: VariantSelection,
    /// Fulfillment provider's variant id, if the product is synced.
    #[serde(default)]
    pub provider_variant_id: Option<i64>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of `unit_price * quantity` over all lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|l| l.quantity).sum()
}

/// Expiry timestamp for a cart touched at `now`.
#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(CART_TTL_DAYS)
}

/// Validate a requested quantity.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` for zero or anything above
/// [`MAX_LINE_QUANTITY`].
pub const fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY {
        return Err(CartError::InvalidQuantity);
    }
    Ok(())
}

/// Ensure `requested` units can be taken from `available` stock.
///
/// # Errors
///
/// Returns `CartError::InsufficientStock` when `requested > available`.
pub fn ensure_stock(available: i32, requested: u32) -> Result<(), CartError> {
    let available = u32::try_from(available).unwrap_or(0);
    if requested > available {
        return Err(CartError::InsufficientStock { available });
    }
    Ok(())
}

/// Units of a given product/variant already in the cart.
#[must_use]
pub fn quantity_in_cart(
    lines: &[CartLine],
    product_id: ProductId,
    variant: &VariantSelection,
) -> u32 {
    lines
        .iter()
        .filter(|l| l.product_id == product_id && l.variant == *variant)
        .map(|l| l.quantity)
        .sum()
}

/// Add a line, merging with an existing line for the same product/variant.
///
/// When merging, the existing line keeps its original price snapshot.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` if the merged quantity exceeds
/// [`MAX_LINE_QUANTITY`].
pub fn add_line(lines: &mut Vec<CartLine>, line: CartLine) -> Result<(), CartError> {
    check_quantity(line.quantity)?;

    if let Some(existing) = lines
        .iter_mut()
        .find(|l| l.product_id == line.product_id && l.variant == line.variant)
    {
        let merged = existing.quantity + line.quantity;
        check_quantity(merged)?;
        existing.quantity = merged;
        return Ok(());
    }

    lines.push(line);
    Ok(())
}

/// Set the quantity of a line.
///
/// # Errors
///
/// Returns `CartError::LineNotFound` or `CartError::InvalidQuantity`.
pub fn set_quantity(lines: &mut [CartLine], line_id: Uuid, quantity: u32) -> Result<(), CartError> {
    check_quantity(quantity)?;
    let line = lines
        .iter_mut()
        .find(|l| l.id == line_id)
        .ok_or(CartError::LineNotFound)?;
    line.quantity = quantity;
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CartError::LineNotFound` if no line has `line_id`.
pub fn remove_line(lines: &mut Vec<CartLine>, line_id: Uuid) -> Result<CartLine, CartError> {
    let index = lines
        .iter()
        .position(|l| l.id == line_id)
        .ok_or(CartError::LineNotFound)?;
    Ok(lines.remove(index))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub fn line(product: i32, size: &str, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            product_slug: format!("product-{product}"),
            image: None,
            category: ProductCategory::Shirts,
            variant: VariantSelection {
                size: Some(size.to_string()),
                color: None,
                sku: None,
            },
            provider_variant_id: None,
            quantity,
            unit_price: price,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_subtotal_is_sum_of_line_totals() {
        let lines = vec![
            line(1, "M", Decimal::new(2500, 2), 2),
            line(2, "L", Decimal::new(1299, 2), 1),
        ];
        assert_eq!(subtotal(&lines), Decimal::new(6299, 2));
        assert_eq!(item_count(&lines), 3);
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_add_line_merges_same_variant() {
        let mut lines = vec![line(1, "M", Decimal::new(2500, 2), 1)];
        // Price changed since the first add; the snapshot is kept
        add_line(&mut lines, line(1, "M", Decimal::new(3000, 2), 2)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].unit_price, Decimal::new(2500, 2));

        add_line(&mut lines, line(1, "L", Decimal::new(2500, 2), 1)).unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_add_line_rejects_overflowing_quantity() {
        let mut lines = vec![line(1, "M", Decimal::ONE, MAX_LINE_QUANTITY)];
        let err = add_line(&mut lines, line(1, "M", Decimal::ONE, 1)).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity);
    }

    #[test]
    fn test_ensure_stock() {
        assert!(ensure_stock(5, 5).is_ok());
        assert_eq!(
            ensure_stock(2, 3),
            Err(CartError::InsufficientStock { available: 2 })
        );
        assert_eq!(
            ensure_stock(-1, 1),
            Err(CartError::InsufficientStock { available: 0 })
        );
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut lines = vec![line(1, "M", Decimal::ONE, 1)];
        let id = lines[0].id;

        set_quantity(&mut lines, id, 4).unwrap();
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(
            set_quantity(&mut lines, id, 0),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(
            set_quantity(&mut lines, Uuid::new_v4(), 1),
            Err(CartError::LineNotFound)
        );

        remove_line(&mut lines, id).unwrap();
        assert!(lines.is_empty());
        assert_eq!(remove_line(&mut lines, id), Err(CartError::LineNotFound));
    }

    #[test]
    fn test_variant_label() {
        let v = VariantSelection {
            size: Some("M".to_string()),
            color: Some("Black".to_string()),
            sku: None,
        };
        assert_eq!(v.label().as_deref(), Some("M / Black"));
        assert_eq!(VariantSelection::default().label(), None);
    }
}
