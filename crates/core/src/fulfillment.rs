//! Fulfillment provider status mapping.
//!
//! The provider has its own status vocabulary for orders and emits webhook
//! events named after what happened. Both are mapped onto
//! [`FulfillmentStatus`] through static tables; anything not in a table passes
//! through unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::FulfillmentStatus;

/// Provider order status → local status.
const ORDER_STATUS_TABLE: &[(&str, FulfillmentStatus)] = &[
    ("draft", FulfillmentStatus::Pending),
    ("pending", FulfillmentStatus::Processing),
    ("inprocess", FulfillmentStatus::InProduction),
    ("onhold", FulfillmentStatus::OnHold),
    ("partial", FulfillmentStatus::PartiallyShipped),
    ("fulfilled", FulfillmentStatus::Shipped),
    ("canceled", FulfillmentStatus::Cancelled),
    ("failed", FulfillmentStatus::Failed),
];

/// Provider webhook event type → local status.
const EVENT_STATUS_TABLE: &[(&str, FulfillmentStatus)] = &[
    ("package_shipped", FulfillmentStatus::Shipped),
    ("package_returned", FulfillmentStatus::Returned),
    ("order_failed", FulfillmentStatus::Failed),
    ("order_canceled", FulfillmentStatus::Cancelled),
    ("order_put_hold", FulfillmentStatus::OnHold),
    ("order_remove_hold", FulfillmentStatus::Processing),
];

fn lookup(table: &[(&str, FulfillmentStatus)], key: &str) -> Option<FulfillmentStatus> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, status)| status.clone())
}

/// Map a provider order status onto the local status.
///
/// Unmapped values pass through unchanged.
#[must_use]
pub fn map_provider_status(provider_status: &str) -> FulfillmentStatus {
    lookup(ORDER_STATUS_TABLE, provider_status)
        .unwrap_or_else(|| FulfillmentStatus::from(provider_status))
}

/// Status implied by a webhook event.
///
/// Events without a table entry fall back to the order status carried in the
/// payload, if any.
#[must_use]
pub fn status_for_event(
    event_type: &str,
    payload_order_status: Option<&str>,
) -> Option<FulfillmentStatus> {
    lookup(EVENT_STATUS_TABLE, event_type).or_else(|| payload_order_status.map(map_provider_status))
}

/// Tracking details copied from the provider's first shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl TrackingInfo {
    /// Whether any tracking field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.carrier.is_none()
            && self.tracking_number.is_none()
            && self.tracking_url.is_none()
            && self.shipped_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry_maps() {
        let expected = [
            ("draft", "pending"),
            ("pending", "processing"),
            ("inprocess", "in_production"),
            ("onhold", "on_hold"),
            ("partial", "partially_shipped"),
            ("fulfilled", "shipped"),
            ("canceled", "cancelled"),
            ("failed", "failed"),
        ];
        for (provider, local) in expected {
            assert_eq!(map_provider_status(provider).as_str(), local, "{provider}");
        }
    }

    #[test]
    fn test_unmapped_status_passes_through() {
        assert_eq!(
            map_provider_status("archived"),
            FulfillmentStatus::Other("archived".to_string())
        );
        assert_eq!(map_provider_status("archived").to_string(), "archived");
    }

    #[test]
    fn test_event_mapping_prefers_event_table() {
        assert_eq!(
            status_for_event("package_shipped", Some("partial")),
            Some(FulfillmentStatus::Shipped)
        );
        assert_eq!(
            status_for_event("order_updated", Some("inprocess")),
            Some(FulfillmentStatus::InProduction)
        );
        assert_eq!(status_for_event("stock_updated", None), None);
    }

    #[test]
    fn test_tracking_info_empty() {
        assert!(TrackingInfo::default().is_empty());
        let info = TrackingInfo {
            carrier: Some("USPS".to_string()),
            ..TrackingInfo::default()
        };
        assert!(!info.is_empty());
    }
}
