//! Route definitions for webhook endpoint management.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Webhook routes mounted at `/webhooks`.
///
/// ```text
/// GET    /                          -> list_webhooks
/// POST   /                          -> create_webhook
/// GET    /{id}                      -> get_webhook
/// DELETE /{id}                      -> delete_webhook
/// POST   /{id}/pause                -> pause_webhook
/// POST   /{id}/resume               -> resume_webhook
/// POST   /{id}/test                 -> test_webhook
/// GET    /{id}/deliveries           -> list_deliveries
/// GET    /deliveries/{id}           -> get_delivery
/// POST   /deliveries/{id}/retry     -> retry_delivery
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(webhooks::list_webhooks).post(webhooks::create_webhook))
        .route(
            "/{id}",
            get(webhooks::get_webhook).delete(webhooks::delete_webhook),
        )
        .route("/{id}/pause", post(webhooks::pause_webhook))
        .route("/{id}/resume", post(webhooks::resume_webhook))
        .route("/{id}/test", post(webhooks::test_webhook))
        .route("/{id}/deliveries", get(webhooks::list_deliveries))
        .route("/deliveries/{id}", get(webhooks::get_delivery))
        .route("/deliveries/{id}/retry", post(webhooks::retry_delivery))
}
