//! Order totals and line-item snapshots.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, VariantSelection};
use crate::types::{ProductId, round_money};

/// Prefix for human-facing order numbers.
pub const ORDER_NUMBER_PREFIX: &str = "INK";

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Monetary breakdown of an order.
///
/// `total = subtotal + shipping - discount + donation`, computed once when the
/// order is created. Tax is not part of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub donation: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from their parts.
    ///
    /// The discount is clamped to the subtotal so a misconfigured promotion can
    /// never make the merchandise portion negative.
    #[must_use]
    pub fn compute(
        subtotal: Decimal,
        shipping: Decimal,
        discount: Decimal,
        donation: Decimal,
    ) -> Self {
        let subtotal = round_money(subtotal);
        let shipping = round_money(shipping.max(Decimal::ZERO));
        let discount = round_money(discount.clamp(Decimal::ZERO, subtotal));
        let donation = round_money(donation.max(Decimal::ZERO));
        Self {
            subtotal,
            shipping,
            discount,
            donation,
            total: subtotal + shipping - discount + donation,
        }
    }
}

/// Immutable copy of a cart line stored on an order.
///
/// Product details are copied so later catalog edits do not alter history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    pub variant: VariantSelection,
    #[serde(default)]
    pub provider_variant_id: Option<i64>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&CartLine> for LineItemSnapshot {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.product_name.clone(),
            slug: line.product_slug.clone(),
            image: line.image.clone(),
            variant: line.variant.clone(),
            provider_variant_id: line.provider_variant_id,
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// Generate an order number such as `INK-20261017-7KQ2MX`.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
            char::from(ORDER_NUMBER_ALPHABET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect();
    format!("{ORDER_NUMBER_PREFIX}-{}-{suffix}", now.format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::line;
    use chrono::TimeZone;

    #[test]
    fn test_total_is_subtotal_plus_shipping_plus_donation() {
        let totals = OrderTotals::compute(
            Decimal::new(5000, 2),
            Decimal::new(599, 2),
            Decimal::ZERO,
            Decimal::new(100, 2),
        );
        assert_eq!(totals.total, Decimal::new(5699, 2));
    }

    #[test]
    fn test_discount_is_subtracted_and_clamped() {
        let totals = OrderTotals::compute(
            Decimal::new(2000, 2),
            Decimal::new(500, 2),
            Decimal::new(5000, 2),
            Decimal::ZERO,
        );
        assert_eq!(totals.discount, Decimal::new(2000, 2));
        assert_eq!(totals.total, Decimal::new(500, 2));
    }

    #[test]
    fn test_snapshot_copies_line_details() {
        let cart_line = line(9, "XL", Decimal::new(3150, 2), 2);
        let snapshot = LineItemSnapshot::from(&cart_line);
        assert_eq!(snapshot.name, "Product 9");
        assert_eq!(snapshot.slug, "product-9");
        assert_eq!(snapshot.line_total, Decimal::new(6300, 2));
        assert_eq!(snapshot.variant.size.as_deref(), Some("XL"));
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("INK-20261017-"));
        assert_eq!(number.len(), "INK-20261017-".len() + 6);
        assert!(
            number
                .chars()
                .skip("INK-20261017-".len())
                .all(|c| ORDER_NUMBER_ALPHABET.contains(&(c as u8)))
        );
    }
}
