//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and the Sentry scope)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on login and checkout routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    RequireAdmin, RequireAdminWrite, RequireSuperAdmin, clear_current_admin, set_current_admin,
};
pub use rate_limit::{checkout_rate_limiter, login_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
