//! Store-wide settings.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Setting keys.
pub mod keys {
    pub const DONATION_AMOUNT: &str = "donation_amount";
    pub const FLAT_SHIPPING_RATE: &str = "flat_shipping_rate";
    pub const TAX_RATE: &str = "tax_rate";
    pub const STORE_NAME: &str = "store_name";

    pub const ALL: [&str; 4] = [DONATION_AMOUNT, FLAT_SHIPPING_RATE, TAX_RATE, STORE_NAME];
}

/// Typed view over the settings table, with defaults for missing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub store_name: String,
    /// Optional donation added at checkout when the customer opts in.
    pub donation_amount: Decimal,
    /// Shipping charged when no provider quote is available.
    pub flat_shipping_rate: Decimal,
    /// Exposed to clients; not applied to order totals.
    pub tax_rate: Decimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "Inkdrop".to_string(),
            donation_amount: Decimal::ONE,
            flat_shipping_rate: Decimal::new(599, 2),
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Read a decimal that may be stored as a JSON number or string.
fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

impl StoreSettings {
    /// Build from raw rows, ignoring unknown keys and malformed values.
    #[must_use]
    pub fn from_values(values: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let decimal = |key: &str, fallback: Decimal| {
            values
                .get(key)
                .and_then(decimal_value)
                .filter(|d| *d >= Decimal::ZERO)
                .unwrap_or(fallback)
        };

        Self {
            store_name: values
                .get(keys::STORE_NAME)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or(defaults.store_name, str::to_string),
            donation_amount: decimal(keys::DONATION_AMOUNT, defaults.donation_amount),
            flat_shipping_rate: decimal(keys::FLAT_SHIPPING_RATE, defaults.flat_shipping_rate),
            tax_rate: decimal(keys::TAX_RATE, defaults.tax_rate),
        }
    }

    /// Key/value pairs for storage.
    #[must_use]
    pub fn to_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            (keys::STORE_NAME, Value::String(self.store_name.clone())),
            (keys::DONATION_AMOUNT, Value::String(self.donation_amount.to_string())),
            (keys::FLAT_SHIPPING_RATE, Value::String(self.flat_shipping_rate.to_string())),
            (keys::TAX_RATE, Value::String(self.tax_rate.to_string())),
        ]
    }
}

/// Partial update from the admin settings form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub donation_amount: Option<Decimal>,
    #[serde(default)]
    pub flat_shipping_rate: Option<Decimal>,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
}

impl SettingsUpdate {
    /// Apply onto current settings.
    ///
    /// # Errors
    ///
    /// Returns a message when a value is negative or the name is blank.
    pub fn apply(self, current: &StoreSettings) -> Result<StoreSettings, String> {
        let mut next = current.clone();
        if let Some(name) = self.store_name {
            let name = name.trim();
            if name.is_empty() {
                return Err("Store name cannot be blank".to_string());
            }
            next.store_name = name.to_string();
        }
        for (label, value, slot) in [
            ("Donation amount", self.donation_amount, &mut next.donation_amount),
            ("Flat shipping rate", self.flat_shipping_rate, &mut next.flat_shipping_rate),
            ("Tax rate", self.tax_rate, &mut next.tax_rate),
        ] {
            if let Some(value) = value {
                if value < Decimal::ZERO {
                    return Err(format!("{label} cannot be negative"));
                }
                *slot = value;
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_for_missing_keys() {
        let settings = StoreSettings::from_values(&HashMap::new());
        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.flat_shipping_rate, Decimal::new(599, 2));
    }

    #[test]
    fn test_numbers_and_strings_both_parse() {
        let values = HashMap::from([
            (keys::DONATION_AMOUNT.to_string(), json!(2.5)),
            (keys::FLAT_SHIPPING_RATE.to_string(), json!("7.25")),
            (keys::TAX_RATE.to_string(), json!("bogus")),
            (keys::STORE_NAME.to_string(), json!("Ink & Paper")),
        ]);
        let settings = StoreSettings::from_values(&values);
        assert_eq!(settings.donation_amount, Decimal::new(25, 1));
        assert_eq!(settings.flat_shipping_rate, Decimal::new(725, 2));
        assert_eq!(settings.tax_rate, Decimal::ZERO);
        assert_eq!(settings.store_name, "Ink & Paper");
    }

    #[test]
    fn test_update_rejects_negative() {
        let update = SettingsUpdate {
            flat_shipping_rate: Some(Decimal::new(-1, 0)),
            ..SettingsUpdate::default()
        };
        assert!(update.apply(&StoreSettings::default()).is_err());

        let update = SettingsUpdate {
            donation_amount: Some(Decimal::TWO),
            ..SettingsUpdate::default()
        };
        let next = update.apply(&StoreSettings::default()).unwrap();
        assert_eq!(next.donation_amount, Decimal::TWO);
    }
}
