//! Cart, promotion and totals rules as the checkout combines them.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use inkdrop_core::ProductCategory;
use inkdrop_core::cart::{self, CartError};
use inkdrop_core::order::OrderTotals;
use inkdrop_core::promotion::{PromotionKind, PromotionRejection, PromotionRule, PromotionScope};
use inkdrop_integration_tests::cart_line;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn rule(kind: PromotionKind, value: &str) -> PromotionRule {
    PromotionRule {
        kind,
        value: dec(value),
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
fn test_totals_without_promotion() {
    let lines = vec![
        cart_line(1, ProductCategory::Shirts, dec("25.00"), 2),
        cart_line(2, ProductCategory::Mugs, dec("14.50"), 1),
    ];
    let subtotal = cart::subtotal(&lines);
    assert_eq!(subtotal, dec("64.50"));

    let totals = OrderTotals::compute(subtotal, dec("5.99"), Decimal::ZERO, Decimal::ONE);
    assert_eq!(totals.total, dec("71.49"));
    assert_eq!(totals.total, totals.subtotal + totals.shipping + totals.donation);
}

#[test]
fn test_category_promotion_discounts_only_matching_lines() {
    let lines = vec![
        cart_line(1, ProductCategory::Shirts, dec("20.00"), 2),
        cart_line(2, ProductCategory::Posters, dec("30.00"), 1),
    ];
    let mut promo = rule(PromotionKind::Percentage, "10");
    promo.scope = PromotionScope::Categories;
    promo.categories = vec![ProductCategory::Posters];

    let discount = promo.evaluate(&lines, Utc::now()).unwrap();
    assert_eq!(discount.amount, dec("3.00"));

    let totals = OrderTotals::compute(cart::subtotal(&lines), dec("5.99"), discount.amount, Decimal::ZERO);
    assert_eq!(totals.total, dec("72.99"));
}

#[test]
fn test_expired_code_is_rejected() {
    let lines = vec![cart_line(1, ProductCategory::Hats, dec("18.00"), 1)];
    let mut promo = rule(PromotionKind::Fixed, "5");
    promo.ends_at = Some(Utc::now() - Duration::days(1));

    assert_eq!(
        promo.evaluate(&lines, Utc::now()),
        Err(PromotionRejection::Expired)
    );
}

#[test]
fn test_discount_clamps_to_max_and_minimum() {
    let lines = vec![cart_line(1, ProductCategory::Hoodies, dec("100.00"), 1)];
    let mut promo = rule(PromotionKind::Percentage, "50");
    promo.max_discount = Some(dec("20"));
    assert_eq!(promo.evaluate(&lines, Utc::now()).unwrap().amount, dec("20.00"));

    promo.min_purchase = Some(dec("150"));
    assert!(matches!(
        promo.evaluate(&lines, Utc::now()),
        Err(PromotionRejection::BelowMinimum { .. })
    ));
    assert_eq!(promo.discount_for_subtotal(dec("100"), Utc::now()), Decimal::ZERO);
}

#[test]
fn test_insufficient_stock_is_rejected() {
    assert!(matches!(
        cart::ensure_stock(2, 3),
        Err(CartError::InsufficientStock { .. })
    ));
    assert!(cart::ensure_stock(3, 3).is_ok());
}
