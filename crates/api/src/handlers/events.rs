//! Event ingestion for producers that talk to the service over HTTP.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use carehook_core::types::EntityId;
use carehook_core::validation::{is_event_name, validate_tenant_id};
use carehook_core::webhooks::WebhookEvent;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /api/v1/events`.
#[derive(Debug, Deserialize)]
pub struct PublishEvent {
    /// FHIR resource type, e.g. `Patient`.
    pub resource_type: String,
    /// Change kind, e.g. `create`.
    pub action: String,
    pub resource_id: String,
    pub tenant_id: String,
    /// Delivered verbatim (compact JSON). Defaults to `{}`.
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct PublishedEvent {
    pub event_id: EntityId,
    pub event_type: String,
}

/// POST /api/v1/events
///
/// Queue an event for fan-out. Returns as soon as the event is on the bus.
pub async fn publish_event(
    State(state): State<AppState>,
    input: Result<Json<PublishEvent>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let resource_type = event_segment("resource_type", &input.resource_type)?;
    let action = event_segment("action", &input.action)?;
    let tenant_id = validate_tenant_id(&input.tenant_id)?;

    let mut event = WebhookEvent::new(resource_type, action, input.resource_id.trim(), tenant_id);
    if let Some(payload) = &input.payload {
        event = event.with_json(payload);
    }

    let published = PublishedEvent {
        event_id: event.id,
        event_type: event.event_type.clone(),
    };
    let subscribers = state.event_bus.publish(event);

    tracing::debug!(
        event_id = %published.event_id,
        event_type = %published.event_type,
        subscribers,
        "Event published",
    );

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: published })))
}

/// One half of a `ResourceType.Action` event type.
fn event_segment<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let value = value.trim();
    if !is_event_name(value) {
        return Err(AppError::BadRequest(format!(
            "{field} must be a non-empty name of ASCII letters, digits, '-' or '_'"
        )));
    }
    Ok(value)
}
