pub mod events;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /webhooks                                  register, list (?tenant_id=)
/// /webhooks/{id}                             get, delete
/// /webhooks/{id}/pause                       pause (POST)
/// /webhooks/{id}/resume                      resume (POST)
/// /webhooks/{id}/test                        test ping (POST)
/// /webhooks/{id}/deliveries                  delivery log
/// /webhooks/deliveries/{id}                  single delivery record
/// /webhooks/deliveries/{id}/retry            retry delivery (POST)
///
/// /events                                    publish event (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhooks::router())
        .nest("/events", events::router())
}
