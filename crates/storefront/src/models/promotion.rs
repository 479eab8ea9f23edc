//! Promotion domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkdrop_core::promotion::{PromotionKind, PromotionRule, PromotionScope};
use inkdrop_core::{ProductCategory, ProductId, PromotionId};

/// A stored promotion.
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    /// Uppercase redemption code; auto-apply promotions may have none.
    pub code: Option<String>,
    pub auto_apply: bool,
    #[serde(flatten)]
    pub rule: PromotionRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a promotion.
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionInput {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub auto_apply: bool,
    pub kind: PromotionKind,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
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
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Canonical form of a promotion code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl PromotionInput {
    /// Validate field combinations and normalize the code.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("Promotion name is required".to_string());
        }
        self.code = self
            .code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());
        if self.code.is_none() && !self.auto_apply {
            return Err("A code is required unless the promotion applies automatically".to_string());
        }

        match self.kind {
            PromotionKind::Percentage if self.value <= Decimal::ZERO || self.value > Decimal::ONE_HUNDRED => {
                return Err("Percentage must be between 0 and 100".to_string());
            }
            PromotionKind::Fixed if self.value <= Decimal::ZERO => {
                return Err("Discount amount must be positive".to_string());
            }
            _ => {}
        }

        match self.scope {
            PromotionScope::Products if self.product_ids.is_empty() => {
                return Err("Select at least one product".to_string());
            }
            PromotionScope::Categories if self.categories.is_empty() => {
                return Err("Select at least one category".to_string());
            }
            _ => {}
        }

        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at)
            && end <= start
        {
            return Err("End date must be after start date".to_string());
        }
        if self.usage_limit.is_some_and(|l| l < 1) {
            return Err("Usage limit must be at least 1".to_string());
        }

        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> PromotionInput {
        PromotionInput {
            name: "Fall sale".to_string(),
            code: Some(" fall10 ".to_string()),
            auto_apply: false,
            kind: PromotionKind::Percentage,
            value: Decimal::TEN,
            scope: PromotionScope::Global,
            product_ids: vec![],
            categories: vec![],
            min_purchase: None,
            max_discount: None,
            usage_limit: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_code_is_uppercased() {
        assert_eq!(input().normalized().unwrap().code.as_deref(), Some("FALL10"));
    }

    #[test]
    fn test_code_required_without_auto_apply() {
        let err = PromotionInput {
            code: Some("  ".to_string()),
            ..input()
        }
        .normalized()
        .unwrap_err();
        assert!(err.contains("code is required"));

        let auto = PromotionInput {
            code: None,
            auto_apply: true,
            ..input()
        };
        assert!(auto.normalized().is_ok());
    }

    #[test]
    fn test_percentage_bounds() {
        let over = PromotionInput {
            value: Decimal::new(150, 0),
            ..input()
        };
        assert!(over.normalized().is_err());

        let free_shipping = PromotionInput {
            kind: PromotionKind::FreeShipping,
            value: Decimal::ZERO,
            ..input()
        };
        assert!(free_shipping.normalized().is_ok());
    }

    #[test]
    fn test_scoped_promotion_needs_targets() {
        let scoped = PromotionInput {
            scope: PromotionScope::Categories,
            ..input()
        };
        assert!(scoped.normalized().is_err());
    }
}
