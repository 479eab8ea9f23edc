//! Checkout: shipping quotes, payment intents and order creation.
//!
//! The flow spans two requests. Creating the payment intent computes the
//! totals and stores a [`CheckoutDraft`] in the session; confirming re-reads
//! the draft, checks the intent with Stripe, and turns the cart into an order.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use inkdrop_core::cart::{self, CartLine};
use inkdrop_core::order::{LineItemSnapshot, OrderTotals, generate_order_number};
use inkdrop_core::{
    Address, AddressError, Email, EmailError, FulfillmentStatus, PaymentStatus, PromotionId,
    to_minor_units,
};

use super::fulfillment::FulfillmentService;
use super::promotions::{AppliedPromotion, PromotionError, PromotionService};
use super::settings::SettingsService;
use super::shipping::{ShippingQuote, ShippingService};
use crate::db::{CartRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{CheckoutDraft, NewOrder, Order, StoreSettings};
use crate::state::AppState;
use crate::stripe::{CreatePaymentIntent, PaymentIntent, StripeError};

/// Payment intent metadata key holding the cart token.
pub const CART_TOKEN_METADATA: &str = "cart_token";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Name is required")]
    MissingName,

    #[error("No checkout in progress")]
    NoCheckout,

    /// The intent does not belong to this session's checkout.
    #[error("Payment does not match this checkout")]
    PaymentMismatch,

    #[error("Payment has not completed (status: {0})")]
    PaymentIncomplete(String),

    /// The cart no longer matches what the payment intent charged for.
    #[error("Your cart changed after payment started. Please contact us with your payment reference")]
    CartChanged,

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Body of `POST /api/checkout/payment-intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub include_donation: bool,
}

/// What the browser needs to collect payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSession {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub publishable_key: String,
    pub shipping: ShippingQuote,
    pub promotion: Option<AppliedPromotion>,
    pub totals: OrderTotals,
}

/// What the confirm endpoint returns: enough for the success page, nothing
/// about the customer.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_number: String,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            total: order.totals.total,
            payment_status: order.payment.status,
            fulfillment_status: order.fulfillment.status.clone(),
        }
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn shipping(&self) -> ShippingService<'a> {
        ShippingService::new(ProductRepository::new(self.state.pool()), self.state.printful())
    }

    async fn cart_lines(&self, token: Option<Uuid>) -> Result<Vec<CartLine>, CheckoutError> {
        let Some(token) = token else {
            return Err(CheckoutError::EmptyCart);
        };
        let lines = CartRepository::new(self.state.pool())
            .get(token)
            .await?
            .map(|stored| stored.lines)
            .unwrap_or_default();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(lines)
    }

    /// Quote shipping for the session's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::InvalidAddress`.
    #[instrument(skip(self, address))]
    pub async fn shipping_quote(
        &self,
        token: Option<Uuid>,
        address: Address,
    ) -> Result<ShippingQuote, CheckoutError> {
        let address = address.validated()?;
        let lines = self.cart_lines(token).await?;
        let settings = SettingsService::new(self.state).get().await?;
        Ok(self
            .shipping()
            .quote(&address, &lines, settings.flat_shipping_rate)
            .await?)
    }

    /// Price the cart and create a Stripe payment intent for the total.
    ///
    /// Returns the draft to keep in the session alongside what the browser
    /// needs to confirm the payment.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad customer input, the promotion
    /// rejection for an unusable code, or the Stripe error.
    #[instrument(skip(self, request))]
    pub async fn create_payment_intent(
        &self,
        token: Option<Uuid>,
        request: CheckoutRequest,
    ) -> Result<(CheckoutDraft, PaymentSession), CheckoutError> {
        let email = Email::parse(&request.email)?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(CheckoutError::MissingName);
        }
        let shipping_address = request.shipping_address.validated()?;
        let billing_address = request.billing_address.map(Address::validated).transpose()?;

        let lines = self.cart_lines(token).await?;
        let settings = SettingsService::new(self.state).get().await?;
        let quote = self
            .shipping()
            .quote(&shipping_address, &lines, settings.flat_shipping_rate)
            .await?;

        let promotion = PromotionService::new(self.state.pool())
            .resolve(request.promo_code.as_deref(), &lines, quote.cost, Utc::now())
            .await?;
        let totals = price(&lines, &quote, promotion.as_ref(), &settings, request.include_donation);

        let amount = to_minor_units(totals.total)
            .ok_or_else(|| StripeError::InvalidAmount(totals.total.to_string()))?;
        let mut metadata = vec![(
            CART_TOKEN_METADATA.to_string(),
            token.map(|t| t.to_string()).unwrap_or_default(),
        )];
        if let Some(code) = promotion.as_ref().and_then(|p| p.code.clone()) {
            metadata.push(("promotion_code".to_string(), code));
        }

        let intent = self
            .state
            .stripe()
            .create_payment_intent(&CreatePaymentIntent {
                amount,
                currency: self.state.config().stripe.currency,
                receipt_email: Some(email.as_str().to_string()),
                description: Some(format!("{} order", settings.store_name)),
                metadata,
            })
            .await?;
        info!(payment_intent_id = %intent.id, total = %totals.total, "Payment intent created");

        let draft = CheckoutDraft {
            payment_intent_id: intent.id.clone(),
            email,
            name,
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            shipping_address,
            billing_address,
            promotion_id: promotion.as_ref().map(|p| p.id),
            promotion_code: promotion.as_ref().and_then(|p| p.code.clone()),
            shipping_method: quote.method.clone(),
            totals,
        };
        let session = PaymentSession {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            publishable_key: self.state.config().stripe.publishable_key.clone(),
            shipping: quote,
            promotion,
            totals,
        };
        Ok((draft, session))
    }

    /// Turn a paid checkout into an order.
    ///
    /// Confirming the same intent twice returns the order created the first
    /// time. Once the order is saved, failures to record the promotion use,
    /// submit to the provider or delete the cart are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCheckout`/`PaymentMismatch` when the intent
    /// does not belong to this session, `PaymentIncomplete` when Stripe has
    /// not captured it, `EmptyCart` when the cart is gone, and `CartChanged`
    /// when the cart no longer matches the amount charged.
    #[instrument(skip(self, draft))]
    pub async fn confirm(
        &self,
        token: Option<Uuid>,
        draft: Option<CheckoutDraft>,
        payment_intent_id: &str,
    ) -> Result<Order, CheckoutError> {
        let orders = OrderRepository::new(self.state.pool());
        if let Some(existing) = orders.get_by_payment_intent(payment_intent_id).await? {
            return Ok(existing);
        }

        let draft = draft_for(draft, payment_intent_id)?;
        let intent = self
            .state
            .stripe()
            .retrieve_payment_intent(payment_intent_id)
            .await?;
        check_intent(&intent, token)?;

        let lines = self.cart_lines(token).await?;
        let totals = charged_totals(&lines, &draft.totals, intent.amount).inspect_err(|_| {
            warn!(
                payment_intent_id,
                charged = intent.amount,
                quoted = %draft.totals.total,
                "Cart changed after the payment intent was created"
            );
        })?;

        let new_order = NewOrder {
            order_number: generate_order_number(Utc::now()),
            email: draft.email,
            customer_name: draft.name,
            phone: draft.phone,
            shipping_address: draft.shipping_address,
            billing_address: draft.billing_address,
            items: lines.iter().map(LineItemSnapshot::from).collect(),
            totals,
            promotion_id: draft.promotion_id,
            promotion_code: draft.promotion_code,
            payment_intent_id: payment_intent_id.to_string(),
            payment_status: PaymentStatus::Succeeded,
        };
        let order = match orders.create(&new_order).await {
            Ok(order) => order,
            Err(RepositoryError::Conflict(_)) => {
                // Another request confirmed the same intent first.
                return orders
                    .get_by_payment_intent(payment_intent_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)
                    .map_err(CheckoutError::from);
            }
            Err(e) => return Err(e.into()),
        };
        info!(order_number = %order.order_number, total = %order.totals.total, "Order created");

        if let Some(promotion_id) = order.promotion_id {
            record_promotion_use(self.state.pool(), promotion_id).await;
        }

        let order = FulfillmentService::new(
            self.state.pool(),
            self.state.printful(),
            self.state.config().stripe.currency,
        )
        .submit_or_log(order)
        .await;

        if let Some(token) = token {
            if let Err(e) = CartRepository::new(self.state.pool()).delete(token).await {
                warn!(error = %e, "Failed to delete cart after checkout");
            }
        }
        Ok(order)
    }
}

/// Count a promotion use for a saved order. The order stands either way.
async fn record_promotion_use(pool: &PgPool, promotion_id: PromotionId) {
    if let Err(e) = PromotionService::new(pool).redeem(promotion_id).await {
        warn!(error = %e, promotion_id = %promotion_id, "Failed to record promotion use");
    }
}

/// The session's draft, if it was made for this payment intent.
fn draft_for(
    draft: Option<CheckoutDraft>,
    payment_intent_id: &str,
) -> Result<CheckoutDraft, CheckoutError> {
    let draft = draft.ok_or(CheckoutError::NoCheckout)?;
    if draft.payment_intent_id != payment_intent_id {
        return Err(CheckoutError::PaymentMismatch);
    }
    Ok(draft)
}

/// The intent must have succeeded and carry this session's cart token.
fn check_intent(intent: &PaymentIntent, token: Option<Uuid>) -> Result<(), CheckoutError> {
    if !intent.is_succeeded() {
        return Err(CheckoutError::PaymentIncomplete(intent.status.clone()));
    }
    let token_matches = token.is_some_and(|t| {
        intent.metadata_value(CART_TOKEN_METADATA) == Some(t.to_string().as_str())
    });
    if !token_matches {
        return Err(CheckoutError::PaymentMismatch);
    }
    Ok(())
}

/// Order totals for the cart as it is now, provided they are still what
/// the customer was charged (`charged` in minor units).
fn charged_totals(
    lines: &[CartLine],
    quoted: &OrderTotals,
    charged: i64,
) -> Result<OrderTotals, CheckoutError> {
    let totals = OrderTotals::compute(
        cart::subtotal(lines),
        quoted.shipping,
        quoted.discount,
        quoted.donation,
    );
    if totals.subtotal != quoted.subtotal || to_minor_units(totals.total) != Some(charged) {
        return Err(CheckoutError::CartChanged);
    }
    Ok(totals)
}

/// Totals for a cart, shipping quote and optional promotion.
fn price(
    lines: &[CartLine],
    quote: &ShippingQuote,
    promotion: Option<&AppliedPromotion>,
    settings: &StoreSettings,
    include_donation: bool,
) -> OrderTotals {
    let discount = promotion.map(|p| p.discount).unwrap_or_default();
    let shipping = if discount.free_shipping {
        Decimal::ZERO
    } else {
        quote.cost
    };
    let donation = if include_donation {
        settings.donation_amount
    } else {
        Decimal::ZERO
    };
    OrderTotals::compute(cart::subtotal(lines), shipping, discount.amount, donation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkdrop_core::cart::VariantSelection;
    use inkdrop_core::promotion::Discount;
    use inkdrop_core::{ProductCategory, ProductId};
    use sqlx::postgres::PgPoolOptions;

    fn line(price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            product_id: ProductId::new(1),
            product_name: "Inkblot Tee".to_string(),
            product_slug: "inkblot-tee".to_string(),
            image: None,
            category: ProductCategory::Shirts,
            variant: VariantSelection::default(),
            provider_variant_id: None,
            quantity,
            unit_price: price,
            added_at: Utc::now(),
        }
    }

    fn promotion(amount: Decimal, free_shipping: bool) -> AppliedPromotion {
        AppliedPromotion {
            id: PromotionId::new(1),
            name: "Launch".to_string(),
            code: Some("LAUNCH".to_string()),
            discount: Discount {
                amount,
                free_shipping,
            },
        }
    }

    #[test]
    fn test_totals_without_promotion_are_subtotal_shipping_donation() {
        let lines = [line(Decimal::new(2500, 2), 2)];
        let settings = StoreSettings::default();
        let quote = ShippingQuote::flat(Decimal::new(599, 2));

        let totals = price(&lines, &quote, None, &settings, true);
        assert_eq!(totals.subtotal, Decimal::new(5000, 2));
        assert_eq!(totals.shipping, Decimal::new(599, 2));
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.donation, settings.donation_amount);
        assert_eq!(
            totals.total,
            totals.subtotal + totals.shipping + settings.donation_amount
        );
    }

    #[test]
    fn test_donation_is_opt_in() {
        let lines = [line(Decimal::TEN, 1)];
        let totals = price(
            &lines,
            &ShippingQuote::flat(Decimal::ONE),
            None,
            &StoreSettings::default(),
            false,
        );
        assert_eq!(totals.donation, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(11, 0));
    }

    #[test]
    fn test_discount_is_subtracted() {
        let lines = [line(Decimal::new(4000, 2), 1)];
        let promo = promotion(Decimal::new(1000, 2), false);
        let totals = price(
            &lines,
            &ShippingQuote::flat(Decimal::new(500, 2)),
            Some(&promo),
            &StoreSettings::default(),
            false,
        );
        assert_eq!(totals.total, Decimal::new(3500, 2));
    }

    #[test]
    fn test_free_shipping_zeroes_shipping() {
        let lines = [line(Decimal::new(4000, 2), 1)];
        let promo = promotion(Decimal::ZERO, true);
        let totals = price(
            &lines,
            &ShippingQuote::flat(Decimal::new(500, 2)),
            Some(&promo),
            &StoreSettings::default(),
            false,
        );
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(4000, 2));
    }

    fn draft(payment_intent_id: &str, totals: OrderTotals) -> CheckoutDraft {
        CheckoutDraft {
            payment_intent_id: payment_intent_id.to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            name: "Ada Lovelace".to_string(),
            phone: None,
            shipping_address: Address {
                name: "Ada Lovelace".to_string(),
                line1: "12 Analytical Way".to_string(),
                line2: None,
                city: "Portland".to_string(),
                state: Some("OR".to_string()),
                postal_code: "97201".to_string(),
                country: "US".to_string(),
                phone: None,
            },
            billing_address: None,
            promotion_id: None,
            promotion_code: None,
            shipping_method: "Flat rate".to_string(),
            totals,
        }
    }

    fn intent(status: &str, amount: i64, token: Option<Uuid>) -> PaymentIntent {
        let mut metadata = std::collections::HashMap::new();
        if let Some(token) = token {
            metadata.insert(CART_TOKEN_METADATA.to_string(), token.to_string());
        }
        PaymentIntent {
            id: "pi_123".to_string(),
            amount,
            currency: "usd".to_string(),
            status: status.to_string(),
            client_secret: None,
            metadata,
        }
    }

    fn quoted_for(lines: &[CartLine]) -> OrderTotals {
        price(
            lines,
            &ShippingQuote::flat(Decimal::new(599, 2)),
            None,
            &StoreSettings::default(),
            false,
        )
    }

    #[test]
    fn test_draft_must_exist_and_match_intent() {
        let totals = quoted_for(&[line(Decimal::TEN, 1)]);
        assert!(matches!(
            draft_for(None, "pi_123"),
            Err(CheckoutError::NoCheckout)
        ));
        assert!(matches!(
            draft_for(Some(draft("pi_other", totals)), "pi_123"),
            Err(CheckoutError::PaymentMismatch)
        ));
        assert!(draft_for(Some(draft("pi_123", totals)), "pi_123").is_ok());
    }

    #[test]
    fn test_intent_must_succeed_for_this_cart() {
        let token = Uuid::new_v4();
        assert!(matches!(
            check_intent(&intent("processing", 1000, Some(token)), Some(token)),
            Err(CheckoutError::PaymentIncomplete(status)) if status == "processing"
        ));
        assert!(matches!(
            check_intent(&intent("succeeded", 1000, Some(Uuid::new_v4())), Some(token)),
            Err(CheckoutError::PaymentMismatch)
        ));
        assert!(matches!(
            check_intent(&intent("succeeded", 1000, Some(token)), None),
            Err(CheckoutError::PaymentMismatch)
        ));
        assert!(check_intent(&intent("succeeded", 1000, Some(token)), Some(token)).is_ok());
    }

    #[test]
    fn test_unchanged_cart_keeps_charged_totals() {
        let lines = [line(Decimal::new(2500, 2), 1)];
        let quoted = quoted_for(&lines);
        let charged = to_minor_units(quoted.total).unwrap();

        let totals = charged_totals(&lines, &quoted, charged).unwrap();
        assert_eq!(totals, quoted);
    }

    #[test]
    fn test_items_added_after_payment_intent_are_rejected() {
        let quoted = quoted_for(&[line(Decimal::new(2500, 2), 1)]);
        let charged = to_minor_units(quoted.total).unwrap();
        let lines = [line(Decimal::new(2500, 2), 1), line(Decimal::new(2500, 2), 1)];

        assert!(matches!(
            charged_totals(&lines, &quoted, charged),
            Err(CheckoutError::CartChanged)
        ));
    }

    #[test]
    fn test_charge_for_a_different_amount_is_rejected() {
        let lines = [line(Decimal::new(2500, 2), 1)];
        let quoted = quoted_for(&lines);
        let charged = to_minor_units(quoted.total).unwrap() - 1;

        assert!(matches!(
            charged_totals(&lines, &quoted, charged),
            Err(CheckoutError::CartChanged)
        ));
    }

    #[test]
    fn test_receipt_leaves_out_customer_details() {
        let order = crate::models::order::tests::order();
        let receipt = serde_json::to_value(OrderReceipt::from(&order)).unwrap();

        assert_eq!(receipt["order_number"], order.order_number.as_str());
        assert!(receipt.get("email").is_none());
        assert!(receipt.get("shipping_address").is_none());
        assert!(receipt.get("customer_name").is_none());
    }

    #[tokio::test]
    async fn test_promotion_use_failure_does_not_fail_checkout() {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy_with("postgres://inkdrop@127.0.0.1:1/unreachable".parse().unwrap());

        // Completes with a warning instead of an error.
        record_promotion_use(&pool, PromotionId::new(7)).await;
    }
}
