//! Stripe request and response types.

use std::collections::HashMap;

use serde::Deserialize;

use inkdrop_core::CurrencyCode;

/// Parameters for creating a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: CurrencyCode,
    pub receipt_email: Option<String>,
    pub description: Option<String>,
    pub metadata: Vec<(String, String)>,
}

impl CreatePaymentIntent {
    /// Form fields in Stripe's bracketed notation.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.as_str().to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        if let Some(email) = &self.receipt_email {
            fields.push(("receipt_email".to_string(), email.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description".to_string(), description.clone()));
        }
        for (key, value) in &self.metadata {
            fields.push((format!("metadata[{key}]"), value.clone()));
        }
        fields
    }
}

/// A Stripe payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    /// `requires_payment_method`, `processing`, `succeeded`, `canceled`, ...
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    /// Whether the charge went through.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// Metadata value by key.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// A Stripe refund.
#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    /// Amount refunded in minor units.
    pub amount: i64,
    /// `pending`, `succeeded`, `failed`, ...
    pub status: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// Error body returned by Stripe.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// A webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The subset of a charge object read from `charge.refunded` events.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeObject {
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub refunded: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_use_bracket_notation() {
        let params = CreatePaymentIntent {
            amount: 2599,
            currency: CurrencyCode::Usd,
            receipt_email: Some("ada@example.com".to_string()),
            description: None,
            metadata: vec![("cart_token".to_string(), "abc".to_string())],
        };
        let fields = params.form_fields();
        assert!(fields.contains(&("amount".to_string(), "2599".to_string())));
        assert!(fields.contains(&("currency".to_string(), "usd".to_string())));
        assert!(fields.contains(&("metadata[cart_token]".to_string(), "abc".to_string())));
        assert!(!fields.iter().any(|(k, _)| k == "description"));
    }

    #[test]
    fn test_event_parses() {
        let event: Event = serde_json::from_str(
            r#"{"id":"evt_1","type":"charge.refunded","data":{"object":{"payment_intent":"pi_1","amount_refunded":500,"refunded":false}}}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "charge.refunded");
        let charge: ChargeObject = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(charge.payment_intent.as_deref(), Some("pi_1"));
        assert_eq!(charge.amount_refunded, 500);
    }
}
