use axum::routing::post;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Event ingestion mounted at `/events`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(events::publish_event))
}
