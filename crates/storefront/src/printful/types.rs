//! Printful request, response and webhook types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkdrop_core::fulfillment::TrackingInfo;

/// Response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: u16,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeError {
    #[serde(default)]
    pub message: Option<String>,
}

/// Offset paging block on list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Paging {
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
}

// =============================================================================
// Sync catalog
// =============================================================================

/// Entry of `GET /store/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncProductSummary {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_ignored: bool,
}

/// Result of `GET /store/products/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncProductDetail {
    pub sync_product: SyncProductSummary,
    #[serde(default)]
    pub sync_variants: Vec<SyncVariant>,
}

/// A sync variant: one sellable size/color of a sync product.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncVariant {
    pub id: i64,
    /// Catalog variant id, used for shipping quotes.
    pub variant_id: i64,
    #[serde(default)]
    pub name: String,
    /// Decimal string, e.g. `"25.00"`.
    #[serde(default)]
    pub retail_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_ignored: bool,
    #[serde(default)]
    pub files: Vec<SyncFile>,
}

impl SyncVariant {
    /// Mockup preview, if Printful rendered one.
    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.file_type == "preview")
            .and_then(|f| f.preview_url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncFile {
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

// =============================================================================
// Shipping
// =============================================================================

/// Recipient address as Printful expects it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recipient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    pub country_code: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&inkdrop_core::Address> for Recipient {
    fn from(address: &inkdrop_core::Address) -> Self {
        Self {
            name: Some(address.name.clone()),
            address1: address.line1.clone(),
            address2: address.line2.clone(),
            city: address.city.clone(),
            state_code: address.state.clone(),
            country_code: address.country.clone(),
            zip: address.postal_code.clone(),
            phone: address.phone.clone(),
            email: None,
        }
    }
}

/// Item in a shipping-rate request.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingItem {
    /// Catalog variant id.
    pub variant_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ShippingRateRequest<'a> {
    pub recipient: &'a Recipient,
    pub items: &'a [ShippingItem],
}

/// One quoted shipping option.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRate {
    pub id: String,
    pub name: String,
    /// Decimal string.
    pub rate: String,
    pub currency: String,
    #[serde(default, rename = "minDeliveryDays")]
    pub min_delivery_days: Option<u32>,
    #[serde(default, rename = "maxDeliveryDays")]
    pub max_delivery_days: Option<u32>,
}

// =============================================================================
// Orders
// =============================================================================

/// Item in an order request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub sync_variant_id: i64,
    pub quantity: u32,
    pub retail_price: String,
    pub name: String,
}

/// Customer-facing amounts printed on the packing slip.
#[derive(Debug, Clone, Serialize)]
pub struct RetailCosts {
    pub currency: String,
    pub subtotal: String,
    pub discount: String,
    pub shipping: String,
    pub total: String,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrder {
    pub external_id: String,
    pub shipping: String,
    pub recipient: Recipient,
    pub items: Vec<OrderItem>,
    pub retail_costs: RetailCosts,
}

/// A Printful order.
#[derive(Debug, Clone, Deserialize)]
pub struct PrintfulOrder {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

/// A shipment of some or all items of an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub shipped_at: Option<i64>,
}

impl Shipment {
    /// Tracking fields copied verbatim.
    #[must_use]
    pub fn tracking(&self) -> TrackingInfo {
        TrackingInfo {
            carrier: self.carrier.clone(),
            tracking_number: self.tracking_number.clone(),
            tracking_url: self.tracking_url.clone(),
            shipped_at: self
                .shipped_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}

/// Printful sends tracking numbers as strings or bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Webhooks
// =============================================================================

/// A webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub order: Option<PrintfulOrder>,
    #[serde(default)]
    pub shipment: Option<Shipment>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl WebhookEvent {
    /// Shipment to copy tracking from: the event's own, else the order's first.
    #[must_use]
    pub fn shipment(&self) -> Option<&Shipment> {
        self.data.shipment.as_ref().or_else(|| {
            self.data
                .order
                .as_ref()
                .and_then(|order| order.shipments.first())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_with_shipment_parses() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "type": "package_shipped",
                "created": 1700000000,
                "data": {
                    "order": {"id": 77, "external_id": "INK-20240101-ABC123", "status": "fulfilled", "shipments": []},
                    "shipment": {"id": 5, "carrier": "USPS", "tracking_number": 9400111, "tracking_url": "https://t.example/9400111", "shipped_at": 1700000000}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "package_shipped");
        let tracking = event.shipment().unwrap().tracking();
        assert_eq!(tracking.carrier.as_deref(), Some("USPS"));
        assert_eq!(tracking.tracking_number.as_deref(), Some("9400111"));
        assert!(tracking.shipped_at.is_some());
    }

    #[test]
    fn test_webhook_without_data_parses() {
        let event: WebhookEvent = serde_json::from_str(r#"{"type":"stock_updated"}"#).unwrap();
        assert!(event.data.order.is_none());
        assert!(event.shipment().is_none());
    }

    #[test]
    fn test_recipient_from_address() {
        let address = inkdrop_core::Address {
            name: "Ada Lovelace".to_string(),
            line1: "1 Analytical Way".to_string(),
            line2: None,
            city: "London".to_string(),
            state: None,
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
            phone: None,
        };
        let json = serde_json::to_value(Recipient::from(&address)).unwrap();
        assert_eq!(json["country_code"], "GB");
        assert!(json.get("state_code").is_none());
    }
}
