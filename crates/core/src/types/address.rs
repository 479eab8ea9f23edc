//! Postal addresses used for shipping and billing.

use serde::{Deserialize, Serialize};

/// Validation errors for an [`Address`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// Country must be an ISO 3166-1 alpha-2 code.
    #[error("country must be a two-letter country code")]
    InvalidCountry,
}

/// A shipping or billing address.
///
/// Field names follow what the fulfillment provider expects for a recipient
/// so the same value can be forwarded without remapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    /// State or province code (e.g. `CA`). Optional outside the US/CA/AU.
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Address {
    /// Check required fields and normalize the country code to uppercase.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field, or `InvalidCountry` when the
    /// country is not two ASCII letters.
    pub fn validated(mut self) -> Result<Self, AddressError> {
        for (field, value) in [
            ("name", &self.name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ] {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(field));
            }
        }

        let country = self.country.trim().to_ascii_uppercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AddressError::InvalidCountry);
        }
        self.country = country;
        self.state = self
            .state
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty());
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            name: "Ada Lovelace".to_string(),
            line1: "12 Analytical Way".to_string(),
            line2: None,
            city: "Portland".to_string(),
            state: Some(" or ".to_string()),
            postal_code: "97201".to_string(),
            country: "us".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_validated_normalizes_codes() {
        let addr = address().validated().unwrap();
        assert_eq!(addr.country, "US");
        assert_eq!(addr.state.as_deref(), Some("OR"));
    }

    #[test]
    fn test_validated_rejects_blank_fields() {
        let mut addr = address();
        addr.city = "  ".to_string();
        assert_eq!(addr.validated(), Err(AddressError::MissingField("city")));
    }

    #[test]
    fn test_validated_rejects_country_names() {
        let mut addr = address();
        addr.country = "USA".to_string();
        assert_eq!(addr.validated(), Err(AddressError::InvalidCountry));
    }
}
