//! Promotion validity and discount calculation.
//!
//! A promotion is valid when it is active, inside its validity window, and has
//! uses left. A valid promotion produces
//! `min(value% of eligible subtotal | fixed value, max_discount, eligible subtotal)`,
//! or zero when the cart subtotal is below the minimum purchase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, subtotal};
use crate::types::{ProductCategory, ProductId, round_money};

/// How the discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// `value` is a percentage of the eligible subtotal.
    Percentage,
    /// `value` is a fixed amount off.
    Fixed,
    /// Shipping is waived; no subtotal discount.
    FreeShipping,
}

/// Which cart lines a promotion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromotionScope {
    #[default]
    Global,
    Products,
    Categories,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {}: {s}", stringify!($ty))),
                }
            }
        }
    };
}

str_enum!(PromotionKind {
    Percentage => "percentage",
    Fixed => "fixed",
    FreeShipping => "free_shipping",
});

str_enum!(PromotionScope {
    Global => "global",
    Products => "products",
    Categories => "categories",
});

/// Why a promotion cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromotionRejection {
    #[error("This promotion is not active")]
    Inactive,
    #[error("This promotion has not started yet")]
    NotStarted,
    #[error("This promotion has expired")]
    Expired,
    #[error("This promotion has reached its usage limit")]
    UsageLimitReached,
    #[error("A minimum purchase of ${minimum:.2} is required")]
    BelowMinimum { minimum: Decimal },
    #[error("This promotion does not apply to the items in your cart")]
    NotApplicable,
}

/// The evaluated effect of a promotion on a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Discount {
    pub amount: Decimal,
    pub free_shipping: bool,
}

/// The rule part of a promotion, independent of how it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRule {
    pub kind: PromotionKind,
    pub value: Decimal,
    pub scope: PromotionScope,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    #[serde(default)]
    pub min_purchase: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub usage_limit: Option<i32>,
    #[serde(default)]
    pub usage_count: i32,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl PromotionRule {
    /// Check activity, validity window and usage cap.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition.
    pub fn check_validity(&self, now: DateTime<Utc>) -> Result<(), PromotionRejection> {
        if !self.is_active {
            return Err(PromotionRejection::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(PromotionRejection::NotStarted);
        }
        if self.ends_at.is_some_and(|end| now > end) {
            return Err(PromotionRejection::Expired);
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
        {
            return Err(PromotionRejection::UsageLimitReached);
        }
        Ok(())
    }

    /// Pure function of `now` and the usage counters.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.check_validity(now).is_ok()
    }

    /// Whether a cart line falls inside this promotion's scope.
    #[must_use]
    pub fn applies_to(&self, line: &CartLine) -> bool {
        match self.scope {
            PromotionScope::Global => true,
            PromotionScope::Products => self.product_ids.contains(&line.product_id),
            PromotionScope::Categories => self.categories.contains(&line.category),
        }
    }

    /// Subtotal of the lines this promotion applies to.
    #[must_use]
    pub fn eligible_subtotal(&self, lines: &[CartLine]) -> Decimal {
        lines
            .iter()
            .filter(|l| self.applies_to(l))
            .map(CartLine::line_total)
            .sum()
    }

    /// Discount on a subtotal, zero when invalid or below the minimum.
    #[must_use]
    pub fn discount_for_subtotal(&self, subtotal: Decimal, now: DateTime<Utc>) -> Decimal {
        if !self.is_valid(now) || self.below_minimum(subtotal) {
            return Decimal::ZERO;
        }
        self.capped(subtotal)
    }

    /// Evaluate against a cart.
    ///
    /// # Errors
    ///
    /// Returns the reason the promotion cannot be applied to these lines.
    pub fn evaluate(
        &self,
        lines: &[CartLine],
        now: DateTime<Utc>,
    ) -> Result<Discount, PromotionRejection> {
        self.check_validity(now)?;

        let cart_subtotal = subtotal(lines);
        if self.below_minimum(cart_subtotal) {
            return Err(PromotionRejection::BelowMinimum {
                minimum: self.min_purchase.unwrap_or_default(),
            });
        }

        let eligible = self.eligible_subtotal(lines);
        if eligible.is_zero() {
            return Err(PromotionRejection::NotApplicable);
        }

        Ok(Discount {
            amount: self.capped(eligible),
            free_shipping: self.kind == PromotionKind::FreeShipping,
        })
    }

    fn below_minimum(&self, subtotal: Decimal) -> bool {
        self.min_purchase.is_some_and(|min| subtotal < min)
    }

    fn capped(&self, base: Decimal) -> Decimal {
        let raw = match self.kind {
            PromotionKind::Percentage => base * self.value / Decimal::ONE_HUNDRED,
            PromotionKind::Fixed => self.value,
            PromotionKind::FreeShipping => Decimal::ZERO,
        };
        let capped = self.max_discount.map_or(raw, |max| raw.min(max));
        round_money(capped.min(base).max(Decimal::ZERO))
    }
}

/// Pick the auto-apply promotion giving the largest saving on `lines`.
///
/// `shipping` is the shipping cost a free-shipping promotion would waive.
#[must_use]
pub fn best_automatic<'a, I>(
    rules: I,
    lines: &[CartLine],
    shipping: Decimal,
    now: DateTime<Utc>,
) -> Option<(usize, Discount)>
where
    I: IntoIterator<Item = &'a PromotionRule>,
{
    rules
        .into_iter()
        .enumerate()
        .filter_map(|(idx, rule)| rule.evaluate(lines, now).ok().map(|d| (idx, d)))
        .max_by_key(|(_, d)| {
            if d.free_shipping {
                d.amount + shipping
            } else {
                d.amount
            }
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::line;
    use chrono::Duration;

    fn rule(kind: PromotionKind, value: Decimal) -> PromotionRule {
        PromotionRule {
            kind,
            value,
            scope: PromotionScope::Global,
            product_ids: Vec::new(),
            categories: Vec::new(),
            min_purchase: None,
            max_discount: None,
            usage_limit: None,
            usage_count: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let promo = rule(PromotionKind::Percentage, Decimal::new(15, 0));
        let discount = promo.discount_for_subtotal(Decimal::new(8000, 2), Utc::now());
        assert_eq!(discount, Decimal::new(1200, 2));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let promo = rule(PromotionKind::Fixed, Decimal::new(25, 0));
        let discount = promo.discount_for_subtotal(Decimal::new(1800, 2), Utc::now());
        assert_eq!(discount, Decimal::new(1800, 2));
    }

    #[test]
    fn test_max_discount_caps_percentage() {
        let mut promo = rule(PromotionKind::Percentage, Decimal::new(50, 0));
        promo.max_discount = Some(Decimal::new(20, 0));
        let discount = promo.discount_for_subtotal(Decimal::new(100, 0), Utc::now());
        assert_eq!(discount, Decimal::new(20, 0));
    }

    #[test]
    fn test_zero_below_minimum_purchase() {
        let mut promo = rule(PromotionKind::Fixed, Decimal::new(10, 0));
        promo.min_purchase = Some(Decimal::new(50, 0));
        assert_eq!(
            promo.discount_for_subtotal(Decimal::new(4999, 2), Utc::now()),
            Decimal::ZERO
        );
        assert_eq!(
            promo.discount_for_subtotal(Decimal::new(50, 0), Utc::now()),
            Decimal::new(10, 0)
        );
    }

    #[test]
    fn test_validity_window_and_usage() {
        let now = Utc::now();

        let mut expired = rule(PromotionKind::Fixed, Decimal::ONE);
        expired.ends_at = Some(now - Duration::days(1));
        assert_eq!(
            expired.check_validity(now),
            Err(PromotionRejection::Expired)
        );
        assert_eq!(
            expired.discount_for_subtotal(Decimal::new(100, 0), now),
            Decimal::ZERO
        );

        let mut future = rule(PromotionKind::Fixed, Decimal::ONE);
        future.starts_at = Some(now + Duration::hours(1));
        assert_eq!(
            future.check_validity(now),
            Err(PromotionRejection::NotStarted)
        );

        let mut used_up = rule(PromotionKind::Fixed, Decimal::ONE);
        used_up.usage_limit = Some(3);
        used_up.usage_count = 3;
        assert_eq!(
            used_up.check_validity(now),
            Err(PromotionRejection::UsageLimitReached)
        );

        let mut inactive = rule(PromotionKind::Fixed, Decimal::ONE);
        inactive.is_active = false;
        assert!(!inactive.is_valid(now));
    }

    #[test]
    fn test_scope_limits_eligible_subtotal() {
        let lines = vec![
            line(1, "M", Decimal::new(20, 0), 1),
            line(2, "M", Decimal::new(30, 0), 1),
        ];
        let mut promo = rule(PromotionKind::Percentage, Decimal::new(10, 0));
        promo.scope = PromotionScope::Products;
        promo.product_ids = vec![ProductId::new(2)];

        let discount = promo.evaluate(&lines, Utc::now()).unwrap();
        assert_eq!(discount.amount, Decimal::new(3, 0));

        promo.product_ids = vec![ProductId::new(99)];
        assert_eq!(
            promo.evaluate(&lines, Utc::now()),
            Err(PromotionRejection::NotApplicable)
        );
    }

    #[test]
    fn test_category_scope() {
        let lines = vec![line(1, "M", Decimal::new(40, 0), 1)];
        let mut promo = rule(PromotionKind::Fixed, Decimal::new(5, 0));
        promo.scope = PromotionScope::Categories;
        promo.categories = vec![ProductCategory::Mugs];
        assert!(promo.evaluate(&lines, Utc::now()).is_err());

        promo.categories.push(ProductCategory::Shirts);
        assert_eq!(
            promo.evaluate(&lines, Utc::now()).unwrap().amount,
            Decimal::new(5, 0)
        );
    }

    #[test]
    fn test_free_shipping_flag() {
        let lines = vec![line(1, "M", Decimal::new(40, 0), 1)];
        let promo = rule(PromotionKind::FreeShipping, Decimal::ZERO);
        let discount = promo.evaluate(&lines, Utc::now()).unwrap();
        assert!(discount.free_shipping);
        assert_eq!(discount.amount, Decimal::ZERO);
    }

    #[test]
    fn test_below_minimum_message() {
        let lines = vec![line(1, "M", Decimal::new(10, 0), 1)];
        let mut promo = rule(PromotionKind::Fixed, Decimal::new(5, 0));
        promo.min_purchase = Some(Decimal::new(25, 0));
        let err = promo.evaluate(&lines, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "A minimum purchase of $25.00 is required");
    }

    #[test]
    fn test_best_automatic_prefers_largest_saving() {
        let lines = vec![line(1, "M", Decimal::new(50, 0), 1)];
        let ten_off = rule(PromotionKind::Fixed, Decimal::new(10, 0));
        let five_pct = rule(PromotionKind::Percentage, Decimal::new(5, 0));
        let free_ship = rule(PromotionKind::FreeShipping, Decimal::ZERO);

        let rules = [five_pct, ten_off, free_ship];
        let (idx, discount) =
            best_automatic(&rules, &lines, Decimal::new(6, 0), Utc::now()).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(discount.amount, Decimal::new(10, 0));

        let (idx, _) = best_automatic(&rules, &lines, Decimal::new(12, 0), Utc::now()).unwrap();
        assert_eq!(idx, 2);
    }
}
