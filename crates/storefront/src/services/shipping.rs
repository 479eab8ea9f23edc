//! Shipping quotes.
//!
//! Printful is asked for live rates and the cheapest one wins. The flat rate
//! from store settings applies whenever a live quote is not possible: Printful
//! is not configured, an item has no catalog variant id, or the request fails.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{instrument, warn};

use inkdrop_core::Address;
use inkdrop_core::cart::CartLine;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;
use crate::printful::{PrintfulClient, Recipient, ShippingItem, ShippingRate};

/// Method name used for the flat-rate fallback.
pub const FLAT_RATE_METHOD: &str = "Standard shipping";

/// The shipping option applied to a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub method: String,
    pub cost: Decimal,
    pub min_delivery_days: Option<u32>,
    pub max_delivery_days: Option<u32>,
    /// Whether the quote came from the fulfillment provider.
    pub live: bool,
}

impl ShippingQuote {
    #[must_use]
    pub fn flat(rate: Decimal) -> Self {
        Self {
            method: FLAT_RATE_METHOD.to_string(),
            cost: rate,
            min_delivery_days: None,
            max_delivery_days: None,
            live: false,
        }
    }
}

/// Shipping service.
pub struct ShippingService<'a> {
    products: ProductRepository<'a>,
    printful: Option<&'a PrintfulClient>,
}

impl<'a> ShippingService<'a> {
    #[must_use]
    pub const fn new(products: ProductRepository<'a>, printful: Option<&'a PrintfulClient>) -> Self {
        Self { products, printful }
    }

    /// Quote shipping for `lines` to `address`.
    ///
    /// Provider failures are logged and answered with the flat rate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if products cannot be loaded.
    #[instrument(skip(self, address, lines), fields(country = %address.country, lines = lines.len()))]
    pub async fn quote(
        &self,
        address: &Address,
        lines: &[CartLine],
        flat_rate: Decimal,
    ) -> Result<ShippingQuote, RepositoryError> {
        let Some(printful) = self.printful else {
            return Ok(ShippingQuote::flat(flat_rate));
        };

        let ids: Vec<_> = lines.iter().map(|l| l.product_id).collect();
        let products = self.products.get_many(&ids).await?;
        let Some(items) = shipping_items(lines, &products) else {
            return Ok(ShippingQuote::flat(flat_rate));
        };

        match printful.shipping_rates(&Recipient::from(address), &items).await {
            Ok(rates) => Ok(cheapest(&rates).unwrap_or_else(|| ShippingQuote::flat(flat_rate))),
            Err(e) => {
                warn!(error = %e, "Printful shipping quote failed, using flat rate");
                Ok(ShippingQuote::flat(flat_rate))
            }
        }
    }
}

/// Map cart lines onto catalog variants for a rate request.
///
/// Returns `None` if any line cannot be mapped.
fn shipping_items(lines: &[CartLine], products: &[Product]) -> Option<Vec<ShippingItem>> {
    if lines.is_empty() {
        return None;
    }
    lines
        .iter()
        .map(|line| {
            let product = products.iter().find(|p| p.id == line.product_id)?;
            let variant = product
                .find_variant(line.variant.size.as_deref(), line.variant.color.as_deref())?;
            Some(ShippingItem {
                variant_id: variant.printful_catalog_variant_id?,
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Cheapest rate with a parseable price.
fn cheapest(rates: &[ShippingRate]) -> Option<ShippingQuote> {
    rates
        .iter()
        .filter_map(|rate| Decimal::from_str(&rate.rate).ok().map(|cost| (rate, cost)))
        .min_by_key(|(_, cost)| *cost)
        .map(|(rate, cost)| ShippingQuote {
            method: rate.name.clone(),
            cost,
            min_delivery_days: rate.min_delivery_days,
            max_delivery_days: rate.max_delivery_days,
            live: true,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::{product, variant};
    use inkdrop_core::ProductId;
    use inkdrop_core::cart::VariantSelection;

    fn rate(name: &str, amount: &str) -> ShippingRate {
        ShippingRate {
            id: name.to_uppercase(),
            name: name.to_string(),
            rate: amount.to_string(),
            currency: "USD".to_string(),
            min_delivery_days: Some(3),
            max_delivery_days: Some(7),
        }
    }

    fn line(size: &str, quantity: u32) -> CartLine {
        CartLine {
            id: uuid::Uuid::new_v4(),
            product_id: ProductId::new(1),
            product_name: "Inkblot Tee".to_string(),
            product_slug: "inkblot-tee".to_string(),
            image: None,
            category: inkdrop_core::ProductCategory::Shirts,
            variant: VariantSelection {
                size: Some(size.to_string()),
                color: None,
                sku: None,
            },
            provider_variant_id: None,
            quantity,
            unit_price: Decimal::new(2500, 2),
            added_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_cheapest_rate_wins() {
        let quote = cheapest(&[rate("Express", "14.50"), rate("Flat", "4.99"), rate("Bad", "n/a")])
            .unwrap();
        assert_eq!(quote.method, "Flat");
        assert_eq!(quote.cost, Decimal::new(499, 2));
        assert!(quote.live);
    }

    #[test]
    fn test_no_rates_means_no_quote() {
        assert!(cheapest(&[]).is_none());
    }

    #[test]
    fn test_items_need_catalog_variant_ids() {
        let mut medium = variant("M", None, 5);
        medium.printful_catalog_variant_id = Some(4012);
        let catalog = vec![product(vec![medium, variant("L", None, 5)])];

        let items = shipping_items(&[line("M", 2)], &catalog).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].variant_id, 4012);
        assert_eq!(items[0].quantity, 2);

        assert!(shipping_items(&[line("M", 1), line("L", 1)], &catalog).is_none());
        assert!(shipping_items(&[], &catalog).is_none());
    }

    #[test]
    fn test_flat_quote() {
        let quote = ShippingQuote::flat(Decimal::new(599, 2));
        assert_eq!(quote.method, FLAT_RATE_METHOD);
        assert!(!quote.live);
    }
}
