//! Domain models for the storefront.

pub mod admin;
pub mod analytics;
pub mod order;
pub mod product;
pub mod promotion;
pub mod session;
pub mod settings;

pub use admin::{Admin, NewAdminInput};
pub use order::{FulfillmentInfo, NewOrder, Order, OrderFilter, OrderSummary, PaymentInfo};
pub use product::{CategorySummary, Product, ProductInput, ProductVariant};
pub use promotion::{Promotion, PromotionInput};
pub use session::{CheckoutDraft, CurrentAdmin, keys as session_keys};
pub use settings::StoreSettings;
