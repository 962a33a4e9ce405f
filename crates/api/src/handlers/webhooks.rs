//! Handlers for webhook endpoint management.
//!
//! Endpoint CRUD and pause/resume, delivery history, test ping, and
//! retry of a recorded delivery.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use carehook_core::types::EntityId;
use carehook_core::webhooks::{NewEndpoint, WebhookEndpoint};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::{ListEndpointsParams, PaginationParams};
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Registration response: the endpoint plus its signing secret, which is
/// not returned by any other route.
#[derive(Debug, Serialize)]
pub struct CreatedEndpoint {
    #[serde(flatten)]
    pub endpoint: WebhookEndpoint,
    pub secret: String,
}

impl From<WebhookEndpoint> for CreatedEndpoint {
    fn from(endpoint: WebhookEndpoint) -> Self {
        let secret = endpoint.secret.clone();
        Self { endpoint, secret }
    }
}

// ---------------------------------------------------------------------------
// Endpoint CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks
///
/// Register a new endpoint. A missing `secret` is generated.
pub async fn create_webhook(
    State(state): State<AppState>,
    input: Result<Json<NewEndpoint>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let endpoint = state.manager.register_endpoint(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedEndpoint::from(endpoint),
        }),
    ))
}

/// GET /api/v1/webhooks?tenant_id=&limit=&offset=
pub async fn list_webhooks(
    State(state): State<AppState>,
    Query(params): Query<ListEndpointsParams>,
) -> AppResult<impl IntoResponse> {
    let tenant_id = params
        .tenant_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("tenant_id query parameter is required".into()))?;

    let (limit, offset) = params.page().window();
    let page = state.manager.list_endpoints(tenant_id, limit, offset).await?;

    Ok(Json(ListResponse::from(page)))
}

/// GET /api/v1/webhooks/{id}
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let endpoint = state.manager.get_endpoint(endpoint_id).await?;
    Ok(Json(DataResponse { data: endpoint }))
}

/// DELETE /api/v1/webhooks/{id}
///
/// Delivery records of the endpoint stay retrievable by id.
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    state.manager.delete_endpoint(endpoint_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/webhooks/{id}/pause
pub async fn pause_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let endpoint = state.manager.pause_endpoint(endpoint_id).await?;
    Ok(Json(DataResponse { data: endpoint }))
}

/// POST /api/v1/webhooks/{id}/resume
pub async fn resume_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let endpoint = state.manager.resume_endpoint(endpoint_id).await?;
    Ok(Json(DataResponse { data: endpoint }))
}

// ---------------------------------------------------------------------------
// Delivery management
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/{id}/test
///
/// Send a `webhook.test` ping and return the resulting delivery record.
/// A failed ping is still a 200: the record carries the failure.
pub async fn test_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let record = state.manager.test_endpoint(endpoint_id).await?;

    tracing::info!(
        endpoint_id = %endpoint_id,
        delivery_id = %record.id,
        status = %record.status,
        "Test webhook delivery sent",
    );

    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/webhooks/{id}/deliveries?limit=&offset=
pub async fn list_deliveries(
    State(state): State<AppState>,
    Path(endpoint_id): Path<EntityId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.window();
    let page = state
        .manager
        .get_delivery_logs(endpoint_id, limit, offset)
        .await?;
    Ok(Json(ListResponse::from(page)))
}

/// GET /api/v1/webhooks/deliveries/{id}
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let record = state.manager.get_delivery(delivery_id).await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/webhooks/deliveries/{id}/retry
///
/// Re-send the recorded payload and return the new delivery record.
pub async fn retry_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let record = state.manager.retry_delivery(delivery_id).await?;
    Ok(Json(DataResponse { data: record }))
}
