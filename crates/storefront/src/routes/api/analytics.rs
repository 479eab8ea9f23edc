//! Browser-reported analytics events.

use axum::{body::Bytes, extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::debug;

use super::ok;
use crate::middleware::session;
use crate::models::analytics::NewEvent;
use crate::services::analytics;
use crate::state::AppState;

/// `POST /api/analytics/events`
///
/// Always succeeds; malformed events are dropped. The session id comes from
/// the visitor's session, never from the body.
pub async fn record(State(state): State<AppState>, session: Session, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<NewEvent>(&body) {
        Ok(event) => {
            let visitor = session::ensure_visitor_id(&session).await.ok();
            analytics::track(state.pool(), event.with_session(visitor));
        }
        Err(e) => debug!(error = %e, "Dropped malformed analytics event"),
    }
    ok(())
}
