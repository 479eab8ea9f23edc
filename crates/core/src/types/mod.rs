//! Core types for Inkdrop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use address::{Address, AddressError};
pub use category::ProductCategory;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, format_money, from_minor_units, round_money, to_minor_units};
pub use status::*;
