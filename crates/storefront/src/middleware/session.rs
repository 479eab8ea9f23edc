//! Session middleware configuration and typed session accessors.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! holds the cart token, the analytics visitor id, the in-progress checkout
//! and the logged-in admin.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use inkdrop_core::cart::CART_TTL_DAYS;

use crate::config::StorefrontConfig;
use crate::models::{CheckoutDraft, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "inkdrop_session";

/// Session expiry in seconds; matches the cart lifetime.
const SESSION_EXPIRY_SECONDS: i64 = CART_TTL_DAYS * 24 * 60 * 60;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by the migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The visitor's cart token, if a cart was ever started.
pub async fn cart_token(session: &Session) -> Option<Uuid> {
    session
        .get::<Uuid>(session_keys::CART_TOKEN)
        .await
        .ok()
        .flatten()
}

/// The visitor's cart token, creating one on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn ensure_cart_token(session: &Session) -> SessionResult<Uuid> {
    if let Some(token) = cart_token(session).await {
        return Ok(token);
    }
    let token = Uuid::new_v4();
    session.insert(session_keys::CART_TOKEN, token).await?;
    Ok(token)
}

/// Anonymous analytics id for this visitor, if one was assigned.
pub async fn visitor_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::VISITOR_ID)
        .await
        .ok()
        .flatten()
}

/// Anonymous analytics id for this visitor, assigning one on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn ensure_visitor_id(session: &Session) -> SessionResult<String> {
    if let Some(id) = visitor_id(session).await {
        return Ok(id);
    }
    let id = Uuid::new_v4().simple().to_string();
    session.insert(session_keys::VISITOR_ID, &id).await?;
    Ok(id)
}

/// The checkout started by the last payment-intent request.
pub async fn checkout_draft(session: &Session) -> Option<CheckoutDraft> {
    session
        .get::<CheckoutDraft>(session_keys::CHECKOUT_DRAFT)
        .await
        .ok()
        .flatten()
}

/// Remember the checkout for confirmation.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn set_checkout_draft(session: &Session, draft: &CheckoutDraft) -> SessionResult<()> {
    session.insert(session_keys::CHECKOUT_DRAFT, draft).await
}

/// Forget the checkout and the cart token once an order exists.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn finish_checkout(session: &Session) -> SessionResult<()> {
    session
        .remove::<CheckoutDraft>(session_keys::CHECKOUT_DRAFT)
        .await?;
    session.remove::<Uuid>(session_keys::CART_TOKEN).await?;
    Ok(())
}
