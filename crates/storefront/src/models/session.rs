//! Session-related types.
//!
//! Types stored in the session for cart, checkout and admin state.

use serde::{Deserialize, Serialize};

use inkdrop_core::order::OrderTotals;
use inkdrop_core::{AdminId, AdminRole, Address, Email, PromotionId};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
}

/// Address and totals captured when the payment intent is created.
///
/// Read back on confirmation so the order matches what was charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub payment_intent_id: String,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub promotion_id: Option<PromotionId>,
    pub promotion_code: Option<String>,
    pub shipping_method: String,
    pub totals: OrderTotals,
}

/// Session keys.
pub mod keys {
    /// Key for the random token that identifies the visitor's cart.
    pub const CART_TOKEN: &str = "cart_token";

    /// Key for the analytics visitor id.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Key for the in-progress checkout.
    pub const CHECKOUT_DRAFT: &str = "checkout_draft";

    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
