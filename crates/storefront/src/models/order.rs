//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkdrop_core::fulfillment::TrackingInfo;
use inkdrop_core::order::{LineItemSnapshot, OrderTotals};
use inkdrop_core::{Address, Email, FulfillmentStatus, OrderId, PaymentStatus, PromotionId};

/// Payment sub-record of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub processor: String,
    pub intent_id: String,
    pub status: PaymentStatus,
    pub refunded_amount: Decimal,
}

/// Fulfillment sub-record of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentInfo {
    pub status: FulfillmentStatus,
    pub provider_order_id: Option<i64>,
    /// Raw status string last reported by the provider.
    pub provider_status: Option<String>,
    #[serde(flatten)]
    pub tracking: TrackingInfo,
}

/// A placed order.
///
/// Line items and totals are fixed at creation; only the payment and
/// fulfillment sub-records change afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub email: Email,
    pub customer_name: String,
    pub phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub items: Vec<LineItemSnapshot>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub promotion_id: Option<PromotionId>,
    pub promotion_code: Option<String>,
    pub payment: PaymentInfo,
    pub fulfillment: FulfillmentInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Amount still refundable.
    #[must_use]
    pub fn refundable_amount(&self) -> Decimal {
        (self.totals.total - self.payment.refunded_amount).max(Decimal::ZERO)
    }

    /// Whether the order has been sent to the fulfillment provider.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.fulfillment.provider_order_id.is_some()
    }
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub email: Email,
    pub customer_name: String,
    pub phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub items: Vec<LineItemSnapshot>,
    pub totals: OrderTotals,
    pub promotion_id: Option<PromotionId>,
    pub promotion_code: Option<String>,
    pub payment_intent_id: String,
    pub payment_status: PaymentStatus,
}

/// Filters for the admin order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    /// Fulfillment status.
    #[serde(default)]
    pub status: Option<String>,
    /// Matches order number, email or customer name.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Compact order row for lists.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub email: String,
    pub customer_name: String,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            email: order.email.as_str().to_string(),
            customer_name: order.customer_name.clone(),
            total: order.totals.total,
            payment_status: order.payment.status,
            fulfillment_status: order.fulfillment.status.clone(),
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use inkdrop_core::cart::VariantSelection;
    use inkdrop_core::{OrderId, ProductId};

    pub fn order_with(provider_variant_id: Option<i64>) -> Order {
        let unit_price = Decimal::new(2500, 2);
        Order {
            id: OrderId::new(7),
            order_number: "INK-20261017-ABC234".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            customer_name: "Ada Lovelace".to_string(),
            phone: Some("555-0100".to_string()),
            shipping_address: Address {
                name: "Ada Lovelace".to_string(),
                line1: "12 Analytical Way".to_string(),
                line2: None,
                city: "Portland".to_string(),
                state: Some("OR".to_string()),
                postal_code: "97201".to_string(),
                country: "US".to_string(),
                phone: None,
            },
            billing_address: None,
            items: vec![LineItemSnapshot {
                product_id: ProductId::new(1),
                name: "Inkblot Tee".to_string(),
                slug: "inkblot-tee".to_string(),
                image: None,
                variant: VariantSelection::default(),
                provider_variant_id,
                unit_price,
                quantity: 2,
                line_total: unit_price * Decimal::TWO,
            }],
            totals: OrderTotals::compute(
                Decimal::new(5000, 2),
                Decimal::new(599, 2),
                Decimal::ZERO,
                Decimal::ONE,
            ),
            promotion_id: None,
            promotion_code: None,
            payment: PaymentInfo {
                processor: "stripe".to_string(),
                intent_id: "pi_123".to_string(),
                status: PaymentStatus::Succeeded,
                refunded_amount: Decimal::ZERO,
            },
            fulfillment: FulfillmentInfo {
                status: FulfillmentStatus::Pending,
                provider_order_id: None,
                provider_status: None,
                tracking: TrackingInfo::default(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Paid order for two tees, not yet sent to the provider.
    pub fn order() -> Order {
        order_with(Some(4011))
    }
}
