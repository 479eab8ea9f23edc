//! Business logic services.
//!
//! Services are thin borrowed structs over repositories and API clients.
//! Route handlers build one per request and map service errors onto
//! [`AppError`](crate::error::AppError).

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod catalog_sync;
pub mod checkout;
pub mod fulfillment;
pub mod promotions;
pub mod refunds;
pub mod settings;
pub mod shipping;
