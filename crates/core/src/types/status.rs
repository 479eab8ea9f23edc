//! Status enums for orders and admins.

use serde::{Deserialize, Serialize};

/// Local fulfillment status of an order.
///
/// Known states have dedicated variants. Provider states that have no local
/// equivalent are kept verbatim in [`FulfillmentStatus::Other`] so nothing the
/// provider reports is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum FulfillmentStatus {
    /// Order recorded locally, not yet accepted by the provider.
    #[default]
    Pending,
    Processing,
    InProduction,
    OnHold,
    PartiallyShipped,
    Shipped,
    Delivered,
    Returned,
    Cancelled,
    Failed,
    /// Unmapped provider status, passed through unchanged.
    Other(String),
}

impl FulfillmentStatus {
    /// Storage form of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::InProduction => "in_production",
            Self::OnHold => "on_hold",
            Self::PartiallyShipped => "partially_shipped",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the order has left the provider's facility.
    #[must_use]
    pub const fn has_shipped(&self) -> bool {
        matches!(
            self,
            Self::PartiallyShipped | Self::Shipped | Self::Delivered | Self::Returned
        )
    }

    /// Whether no further provider updates are expected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Returned | Self::Cancelled | Self::Failed
        )
    }
}

impl From<String> for FulfillmentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "in_production" => Self::InProduction,
            "on_hold" => Self::OnHold,
            "partially_shipped" => Self::PartiallyShipped,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "returned" => Self::Returned,
            "cancelled" => Self::Cancelled,
            "failed" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for FulfillmentStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<FulfillmentStatus> for String {
    fn from(status: FulfillmentStatus) -> Self {
        match status {
            FulfillmentStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of an order, as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
    PartiallyRefunded,
    Refunded,
}

impl PaymentStatus {
    /// Storage form of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
        }
    }

    /// Map a Stripe payment intent status onto the local status.
    #[must_use]
    pub fn from_intent_status(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin user management.
    SuperAdmin,
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

impl AdminRole {
    /// Whether this role may create, update or delete store data.
    #[must_use]
    pub const fn can_write(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_status_string_round_trip() {
        for status in [
            FulfillmentStatus::Pending,
            FulfillmentStatus::InProduction,
            FulfillmentStatus::PartiallyShipped,
            FulfillmentStatus::Cancelled,
        ] {
            let raw = String::from(status.clone());
            assert_eq!(FulfillmentStatus::from(raw), status);
        }
    }

    #[test]
    fn test_fulfillment_status_keeps_unknown_values() {
        let status = FulfillmentStatus::from("archived");
        assert_eq!(status, FulfillmentStatus::Other("archived".to_string()));
        assert_eq!(status.to_string(), "archived");

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"archived\"");
    }

    #[test]
    fn test_fulfillment_status_serde() {
        let json = serde_json::to_string(&FulfillmentStatus::OnHold).unwrap();
        assert_eq!(json, "\"on_hold\"");
        let parsed: FulfillmentStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(parsed, FulfillmentStatus::Shipped);
        assert!(parsed.has_shipped());
    }

    #[test]
    fn test_payment_status_from_intent() {
        assert_eq!(
            PaymentStatus::from_intent_status("succeeded"),
            PaymentStatus::Succeeded
        );
        assert_eq!(
            PaymentStatus::from_intent_status("canceled"),
            PaymentStatus::Failed
        );
        assert_eq!(
            PaymentStatus::from_intent_status("requires_action"),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
        assert_eq!("viewer".parse::<AdminRole>(), Ok(AdminRole::Viewer));
        assert_eq!(AdminRole::SuperAdmin.to_string(), "super_admin");
    }
}
