//! Promotion lookup and evaluation against a cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};

use inkdrop_core::cart::CartLine;
use inkdrop_core::promotion::{Discount, PromotionRejection, best_automatic};
use inkdrop_core::PromotionId;

use crate::db::{PromotionRepository, RepositoryError};
use crate::models::Promotion;

/// Errors from promotion lookups.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// No promotion has this code.
    #[error("Invalid promotion code")]
    UnknownCode,

    /// The promotion exists but cannot be applied.
    #[error(transparent)]
    Rejected(#[from] PromotionRejection),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A promotion together with its effect on a cart.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedPromotion {
    pub id: PromotionId,
    pub name: String,
    pub code: Option<String>,
    pub discount: Discount,
}

impl AppliedPromotion {
    fn new(promotion: &Promotion, discount: Discount) -> Self {
        Self {
            id: promotion.id,
            name: promotion.name.clone(),
            code: promotion.code.clone(),
            discount,
        }
    }
}

/// Promotion service.
pub struct PromotionService<'a> {
    promotions: PromotionRepository<'a>,
}

impl<'a> PromotionService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            promotions: PromotionRepository::new(pool),
        }
    }

    /// Validate a customer-entered code against the cart.
    ///
    /// # Errors
    ///
    /// Returns `PromotionError::UnknownCode` if no promotion has the code and
    /// `PromotionError::Rejected` with the specific reason otherwise.
    pub async fn validate_code(
        &self,
        code: &str,
        lines: &[CartLine],
        now: DateTime<Utc>,
    ) -> Result<AppliedPromotion, PromotionError> {
        let promotion = self
            .promotions
            .get_by_code(code)
            .await?
            .ok_or(PromotionError::UnknownCode)?;

        let discount = promotion.rule.evaluate(lines, now).inspect_err(|reason| {
            debug!(promotion_id = %promotion.id, %reason, "Promotion code rejected");
        })?;
        Ok(AppliedPromotion::new(&promotion, discount))
    }

    /// Best auto-apply promotion for the cart, if any qualifies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if promotions cannot be loaded.
    pub async fn best_automatic(
        &self,
        lines: &[CartLine],
        shipping: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<AppliedPromotion>, RepositoryError> {
        let candidates = self.promotions.active_automatic().await?;
        Ok(
            best_automatic(candidates.iter().map(|p| &p.rule), lines, shipping, now)
                .and_then(|(idx, discount)| {
                    candidates
                        .get(idx)
                        .map(|promotion| AppliedPromotion::new(promotion, discount))
                }),
        )
    }

    /// The entered code when there is one, else the best auto-apply promotion.
    ///
    /// # Errors
    ///
    /// Returns `PromotionError` when an entered code is unknown or rejected.
    pub async fn resolve(
        &self,
        code: Option<&str>,
        lines: &[CartLine],
        shipping: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<AppliedPromotion>, PromotionError> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => self.validate_code(code, lines, now).await.map(Some),
            None => Ok(self.best_automatic(lines, shipping, now).await?),
        }
    }

    /// Count one redemption.
    ///
    /// The order has already been paid for, so a usage cap reached in the
    /// meantime is only logged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn redeem(&self, id: PromotionId) -> Result<(), RepositoryError> {
        if !self.promotions.increment_usage(id).await? {
            warn!(promotion_id = %id, "Promotion redeemed past its usage limit");
        }
        Ok(())
    }
}
