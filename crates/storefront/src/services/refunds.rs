//! Refunds and payment status changes reported by Stripe.
//!
//! Admin refunds go through Stripe first; the order only records what Stripe
//! accepted. `charge.refunded` webhooks carry the cumulative refunded amount,
//! so refunds made in the Stripe dashboard end up on the order as well.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use inkdrop_core::{PaymentStatus, from_minor_units, round_money, to_minor_units};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::Order;
use crate::stripe::{StripeClient, StripeError};

/// Errors from refund operations.
#[derive(Debug, Error)]
pub enum RefundError {
    #[error("Only paid orders can be refunded")]
    NotPaid,

    #[error("Refund amount must be greater than zero")]
    InvalidAmount,

    #[error("Refund exceeds the refundable amount of {0}")]
    ExceedsRefundable(Decimal),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Payment status once `refunded` of `total` has been returned.
#[must_use]
pub fn status_after_refund(total: Decimal, refunded: Decimal) -> PaymentStatus {
    if refunded <= Decimal::ZERO {
        PaymentStatus::Succeeded
    } else if refunded >= total {
        PaymentStatus::Refunded
    } else {
        PaymentStatus::PartiallyRefunded
    }
}

/// Amount to refund for a request, defaulting to everything refundable.
///
/// # Errors
///
/// Returns `RefundError` when the order is unpaid or the amount is out of range.
pub fn refund_amount(order: &Order, requested: Option<Decimal>) -> Result<Decimal, RefundError> {
    if !matches!(
        order.payment.status,
        PaymentStatus::Succeeded | PaymentStatus::PartiallyRefunded
    ) {
        return Err(RefundError::NotPaid);
    }

    let refundable = order.refundable_amount();
    let amount = round_money(requested.unwrap_or(refundable));
    if amount <= Decimal::ZERO {
        return Err(RefundError::InvalidAmount);
    }
    if amount > refundable {
        return Err(RefundError::ExceedsRefundable(refundable));
    }
    Ok(amount)
}

/// Refund service.
pub struct RefundService<'a> {
    orders: OrderRepository<'a>,
    stripe: &'a StripeClient,
}

impl<'a> RefundService<'a> {
    #[must_use]
    pub const fn new(orders: OrderRepository<'a>, stripe: &'a StripeClient) -> Self {
        Self { orders, stripe }
    }

    /// Refund part or all of an order through Stripe.
    ///
    /// # Errors
    ///
    /// Returns `RefundError` if the amount is not refundable or Stripe
    /// rejects the refund.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn refund(
        &self,
        order: &Order,
        requested: Option<Decimal>,
    ) -> Result<Order, RefundError> {
        let amount = refund_amount(order, requested)?;
        let cents = to_minor_units(amount).ok_or(RefundError::InvalidAmount)?;

        let refund = self
            .stripe
            .create_refund(&order.payment.intent_id, Some(cents))
            .await?;

        let refunded = order.payment.refunded_amount + from_minor_units(refund.amount);
        let status = status_after_refund(order.totals.total, refunded);
        let updated = self.orders.update_payment(order.id, status, refunded).await?;
        info!(refund_id = %refund.id, %amount, status = %status, "Order refunded");
        Ok(updated)
    }

    /// Record the cumulative refund Stripe reported for an intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order cannot be loaded or saved.
    pub async fn record_refunded(
        &self,
        payment_intent_id: &str,
        amount_refunded_cents: i64,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(order) = self.orders.get_by_payment_intent(payment_intent_id).await? else {
            warn!(payment_intent_id, "Refund for unknown payment intent ignored");
            return Ok(None);
        };

        let refunded = from_minor_units(amount_refunded_cents);
        if refunded <= order.payment.refunded_amount {
            return Ok(Some(order));
        }
        let status = status_after_refund(order.totals.total, refunded);
        self.orders
            .update_payment(order.id, status, refunded)
            .await
            .map(Some)
    }

    /// Mark the order for an intent as failed, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order cannot be loaded or saved.
    pub async fn record_failed(&self, payment_intent_id: &str) -> Result<Option<Order>, RepositoryError> {
        let Some(order) = self.orders.get_by_payment_intent(payment_intent_id).await? else {
            return Ok(None);
        };
        self.orders
            .update_payment(order.id, PaymentStatus::Failed, order.payment.refunded_amount)
            .await
            .map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::tests::order;

    #[test]
    fn test_status_after_refund() {
        let total = Decimal::new(5000, 2);
        assert_eq!(status_after_refund(total, Decimal::ZERO), PaymentStatus::Succeeded);
        assert_eq!(
            status_after_refund(total, Decimal::new(1000, 2)),
            PaymentStatus::PartiallyRefunded
        );
        assert_eq!(status_after_refund(total, total), PaymentStatus::Refunded);
    }

    #[test]
    fn test_full_refund_by_default() {
        let order = order();
        assert_eq!(refund_amount(&order, None).unwrap(), order.totals.total);
    }

    #[test]
    fn test_refund_bounds() {
        let mut order = order();
        order.payment.refunded_amount = order.totals.total - Decimal::ONE;

        assert!(matches!(
            refund_amount(&order, Some(Decimal::TEN)),
            Err(RefundError::ExceedsRefundable(_))
        ));
        assert!(matches!(
            refund_amount(&order, Some(Decimal::ZERO)),
            Err(RefundError::InvalidAmount)
        ));
        assert_eq!(refund_amount(&order, Some(Decimal::ONE)).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_unpaid_order_cannot_be_refunded() {
        let mut order = order();
        order.payment.status = PaymentStatus::Refunded;
        assert!(matches!(refund_amount(&order, None), Err(RefundError::NotPaid)));
    }
}
