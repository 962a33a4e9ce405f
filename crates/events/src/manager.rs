//! Endpoint lifecycle and event fan-out.
//!
//! [`WebhookManager`] is the single entry point used by producers (via
//! [`deliver`](WebhookManager::deliver)) and by the management API. It is
//! cheap to clone and safe to share across request handlers.

use std::sync::Arc;

use carehook_core::matching;
use carehook_core::pagination::Page;
use carehook_core::secrets::secret_or_generate;
use carehook_core::types::{new_id, EntityId};
use carehook_core::validation::{
    validate_endpoint_url, validate_event_patterns, validate_tenant_id, EndpointPolicy,
};
use carehook_core::webhooks::{
    DeliveryOutcome, DeliveryRecord, EndpointStatus, NewEndpoint, WebhookEndpoint, WebhookEvent,
};
use carehook_db::{EndpointStore, StoreError};
use chrono::Utc;
use tokio::task::JoinSet;

use crate::delivery::executor::{DeliveryExecutor, OutboundMessage};
use crate::error::WebhookError;

#[derive(Clone)]
pub struct WebhookManager {
    store: Arc<dyn EndpointStore>,
    executor: DeliveryExecutor,
    policy: EndpointPolicy,
}

impl WebhookManager {
    pub fn new(
        store: Arc<dyn EndpointStore>,
        executor: DeliveryExecutor,
        policy: EndpointPolicy,
    ) -> Self {
        Self {
            store,
            executor,
            policy,
        }
    }

    // -----------------------------------------------------------------------
    // Endpoint lifecycle
    // -----------------------------------------------------------------------

    /// Validate and register a new endpoint in `active` status.
    ///
    /// A missing or blank secret is replaced by a generated one.
    pub async fn register_endpoint(
        &self,
        input: NewEndpoint,
    ) -> Result<WebhookEndpoint, WebhookError> {
        let url = validate_endpoint_url(&input.url, self.policy)?;
        let events = validate_event_patterns(&input.events)?;
        let tenant_id = validate_tenant_id(&input.tenant_id)?;

        let endpoint = WebhookEndpoint {
            id: new_id(),
            url,
            secret: secret_or_generate(input.secret.as_deref()),
            tenant_id,
            client_id: input.client_id.trim().to_string(),
            events,
            status: EndpointStatus::Active,
            created_at: Utc::now(),
        };

        let created = self.store.create_endpoint(endpoint).await?;

        tracing::info!(
            endpoint_id = %created.id,
            tenant_id = %created.tenant_id,
            url = %created.url,
            events = ?created.events,
            "Webhook endpoint registered",
        );

        Ok(created)
    }

    pub async fn get_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, WebhookError> {
        Ok(self.store.get_endpoint(id).await?)
    }

    pub async fn list_endpoints(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<WebhookEndpoint>, WebhookError> {
        Ok(self.store.list_endpoints(tenant_id, limit, offset).await?)
    }

    /// Stop fan-out deliveries to an endpoint. Pausing twice is a no-op.
    pub async fn pause_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, WebhookError> {
        self.set_status(id, EndpointStatus::Paused).await
    }

    /// Re-enable fan-out deliveries to an endpoint.
    pub async fn resume_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, WebhookError> {
        self.set_status(id, EndpointStatus::Active).await
    }

    async fn set_status(
        &self,
        id: EntityId,
        status: EndpointStatus,
    ) -> Result<WebhookEndpoint, WebhookError> {
        let endpoint = self.store.update_status(id, status).await?;
        tracing::info!(endpoint_id = %id, status = %status, "Webhook endpoint status changed");
        Ok(endpoint)
    }

    /// Remove an endpoint. Its delivery history stays in the store.
    pub async fn delete_endpoint(&self, id: EntityId) -> Result<(), WebhookError> {
        self.store.delete_endpoint(id).await?;
        tracing::info!(endpoint_id = %id, "Webhook endpoint deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Fan `event` out to every active endpoint of its tenant whose patterns
    /// match the event type.
    ///
    /// One task per endpoint; all run concurrently and this waits for every
    /// one to finish (each is bounded by the client timeout). Paused and
    /// non-matching endpoints produce no outcome and no record. Outcomes come
    /// back in completion order.
    pub async fn deliver(&self, event: &WebhookEvent) -> Result<Vec<DeliveryOutcome>, WebhookError> {
        let endpoints = self.store.endpoints_for_tenant(&event.tenant_id).await?;
        let targets: Vec<WebhookEndpoint> = endpoints
            .into_iter()
            .filter(|ep| ep.is_active() && matching::any_matches(&ep.events, &event.event_type))
            .collect();

        if targets.is_empty() {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                tenant_id = %event.tenant_id,
                "No active endpoints match event",
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            tenant_id = %event.tenant_id,
            endpoint_count = targets.len(),
            "Delivering event to matching endpoints",
        );

        let mut tasks = JoinSet::new();
        for endpoint in targets {
            let manager = self.clone();
            let message = OutboundMessage::from(event);
            tasks.spawn(async move {
                let (record, stored) = manager.send_and_record(&endpoint, message, 1).await;
                DeliveryOutcome {
                    endpoint_id: endpoint.id,
                    record,
                    recorded: stored.is_ok(),
                }
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(event_id = %event.id, error = %e, "Delivery task did not complete");
                }
            }
        }
        Ok(outcomes)
    }

    /// Re-send a recorded delivery's exact payload to the same endpoint.
    ///
    /// The matcher and the endpoint's paused status are not consulted: the
    /// delivery already matched, and a retry is an explicit operator action.
    /// The new record's attempt is one more than the record being retried.
    pub async fn retry_delivery(&self, delivery_id: EntityId) -> Result<DeliveryRecord, WebhookError> {
        let previous = self.store.get_delivery(delivery_id).await?;
        let endpoint = self.store.get_endpoint(previous.endpoint_id).await?;

        let message = OutboundMessage {
            event_id: previous.event_id,
            event_type: previous.event_type.clone(),
            payload: previous.payload.clone(),
        };
        let attempt = previous.attempt.saturating_add(1);
        let (record, stored) = self.send_and_record(&endpoint, message, attempt).await;
        stored?;

        tracing::info!(
            delivery_id = %record.id,
            retried_delivery_id = %delivery_id,
            endpoint_id = %endpoint.id,
            attempt,
            status = %record.status,
            "Webhook delivery retried",
        );
        Ok(record)
    }

    /// Send a synthetic `webhook.test` event to one endpoint, recorded like a
    /// real delivery.
    pub async fn test_endpoint(&self, endpoint_id: EntityId) -> Result<DeliveryRecord, WebhookError> {
        let endpoint = self.store.get_endpoint(endpoint_id).await?;
        let ping = WebhookEvent::test_ping(&endpoint);

        let (record, stored) = self
            .send_and_record(&endpoint, OutboundMessage::from(&ping), 1)
            .await;
        stored?;
        Ok(record)
    }

    /// Newest-first page of an endpoint's delivery log.
    pub async fn get_delivery_logs(
        &self,
        endpoint_id: EntityId,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DeliveryRecord>, WebhookError> {
        self.store.get_endpoint(endpoint_id).await?;
        Ok(self.store.list_deliveries(endpoint_id, limit, offset).await?)
    }

    pub async fn get_delivery(&self, delivery_id: EntityId) -> Result<DeliveryRecord, WebhookError> {
        Ok(self.store.get_delivery(delivery_id).await?)
    }

    /// One executor attempt plus its audit row.
    ///
    /// The record is returned even when appending it failed, so fan-out can
    /// still report what happened on the wire.
    async fn send_and_record(
        &self,
        endpoint: &WebhookEndpoint,
        message: OutboundMessage,
        attempt: i32,
    ) -> (DeliveryRecord, Result<(), StoreError>) {
        let outcome = self.executor.send(endpoint, &message).await;

        if outcome.is_success() {
            tracing::info!(
                endpoint_id = %endpoint.id,
                event_id = %message.event_id,
                event_type = %message.event_type,
                status_code = outcome.status_code,
                attempt,
                duration_ms = outcome.duration_ms,
                "Webhook delivered",
            );
        } else {
            tracing::warn!(
                endpoint_id = %endpoint.id,
                event_id = %message.event_id,
                event_type = %message.event_type,
                status_code = outcome.status_code,
                attempt,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Webhook delivery failed",
            );
        }

        let record = DeliveryRecord::from_attempt(
            endpoint.id,
            message.event_id,
            &message.event_type,
            attempt,
            message.payload,
            outcome,
        );

        match self.store.append_delivery(record.clone()).await {
            Ok(stored) => (stored, Ok(())),
            Err(e) => {
                tracing::error!(
                    endpoint_id = %endpoint.id,
                    delivery_id = %record.id,
                    error = %e,
                    "Failed to record webhook delivery",
                );
                (record, Err(e))
            }
        }
    }
}
