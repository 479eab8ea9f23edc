//! Printful REST client.
//!
//! Printful wraps every response in `{ "code", "result", "error" }`. The
//! client unwraps the envelope and exposes typed results for the sync catalog,
//! shipping quotes and orders. Webhook payloads are parsed by
//! [`types::WebhookEvent`].

mod client;
pub mod types;

pub use client::PrintfulClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to Printful.
#[derive(Debug, Error)]
pub enum PrintfulError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Printful returned an error envelope.
    #[error("Printful API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}
