//! The storage seam used by the delivery engine.

use async_trait::async_trait;
use carehook_core::pagination::Page;
use carehook_core::types::EntityId;
use carehook_core::webhooks::{DeliveryRecord, EndpointStatus, WebhookEndpoint};

use crate::error::StoreError;

/// Durable mapping of endpoint id to [`WebhookEndpoint`] plus the
/// append-only delivery log.
///
/// Implementations must be safe to call concurrently from many tasks:
/// concurrent appends must never lose or corrupt records. Listings are
/// newest-first and report a `total` that ignores the page window.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Insert a new endpoint. Fails with `Duplicate` if the id is taken.
    async fn create_endpoint(&self, endpoint: WebhookEndpoint)
        -> Result<WebhookEndpoint, StoreError>;

    async fn get_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, StoreError>;

    /// One page of a tenant's endpoints, newest first.
    async fn list_endpoints(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<WebhookEndpoint>, StoreError>;

    /// Every endpoint of a tenant, newest first, regardless of status.
    async fn endpoints_for_tenant(&self, tenant_id: &str)
        -> Result<Vec<WebhookEndpoint>, StoreError>;

    async fn update_status(
        &self,
        id: EntityId,
        status: EndpointStatus,
    ) -> Result<WebhookEndpoint, StoreError>;

    /// Remove an endpoint. Its delivery records are kept.
    async fn delete_endpoint(&self, id: EntityId) -> Result<(), StoreError>;

    async fn append_delivery(&self, record: DeliveryRecord) -> Result<DeliveryRecord, StoreError>;

    /// One page of an endpoint's delivery log, newest first.
    async fn list_deliveries(
        &self,
        endpoint_id: EntityId,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DeliveryRecord>, StoreError>;

    async fn get_delivery(&self, id: EntityId) -> Result<DeliveryRecord, StoreError>;
}
