//! Money helpers built on decimal arithmetic.
//!
//! All amounts in Inkdrop are `rust_decimal::Decimal` in the currency's
//! standard unit (dollars, not cents). Payment processors want integer minor
//! units, so conversion happens only at that boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to integer minor units (cents).
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (round_money(amount) * Decimal::ONE_HUNDRED).to_i64()
}

/// Convert integer minor units (cents) back to an amount.
#[must_use]
pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format an amount for display, e.g. `$24.50`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_money(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

/// ISO 4217 currency codes the store can charge in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl CurrencyCode {
    /// Lowercase code as expected by Stripe.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Gbp => "gbp",
            Self::Cad => "cad",
            Self::Aud => "aud",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::Usd),
            "eur" => Ok(Self::Eur),
            "gbp" => Ok(Self::Gbp),
            "cad" => Ok(Self::Cad),
            "aud" => Ok(Self::Aud),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(Decimal::new(2499, 2)), Some(2499));
        assert_eq!(to_minor_units(Decimal::new(10, 0)), Some(1000));
        // 12.345 rounds half away from zero
        assert_eq!(to_minor_units(Decimal::new(12345, 3)), Some(1235));
        assert_eq!(from_minor_units(599), Decimal::new(599, 2));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(5, 0)), "$5.00");
        assert_eq!(format_money(Decimal::new(24999, 3)), "$25.00");
        assert_eq!(format_money(Decimal::new(-150, 2)), "-$1.50");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("USD".parse::<CurrencyCode>(), Ok(CurrencyCode::Usd));
        assert_eq!(CurrencyCode::Gbp.as_str(), "gbp");
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }
}
