//! Inkdrop Core - Shared domain types and pricing rules.
//!
//! This crate provides the types used across all Inkdrop components:
//! - `storefront` - Public store, JSON API, admin API and webhooks
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides a number or a status lives
//! here so it can be tested without a running store.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money helpers, addresses, statuses
//! - [`cart`] - Cart lines and subtotal math
//! - [`order`] - Order totals and line-item snapshots
//! - [`promotion`] - Promotion validity and discount calculation
//! - [`fulfillment`] - Fulfillment provider status mapping
//! - [`lockout`] - Admin login lockout policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod fulfillment;
pub mod lockout;
pub mod order;
pub mod promotion;
pub mod types;

pub use types::*;
