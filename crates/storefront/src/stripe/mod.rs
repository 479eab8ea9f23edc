//! Stripe REST client.
//!
//! Only the handful of endpoints checkout needs are wrapped: payment intents
//! (create/retrieve) and refunds. Requests are form-encoded and authenticated
//! with the secret key as a bearer token.
//!
//! # Example
//!
//! ```rust,ignore
//! use inkdrop_storefront::stripe::{CreatePaymentIntent, StripeClient};
//!
//! let stripe = StripeClient::new(&config.stripe)?;
//! let intent = stripe
//!     .create_payment_intent(&CreatePaymentIntent {
//!         amount: 2599,
//!         currency: CurrencyCode::Usd,
//!         receipt_email: Some("ada@example.com".into()),
//!         description: None,
//!         metadata: vec![("cart_token".into(), token.to_string())],
//!     })
//!     .await?;
//! ```

mod client;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the request.
    #[error("Stripe API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Amount cannot be expressed in minor units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
