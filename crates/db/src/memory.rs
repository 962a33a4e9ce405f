//! In-memory [`EndpointStore`] backed by hash maps behind a single lock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use carehook_core::pagination::Page;
use carehook_core::types::EntityId;
use carehook_core::webhooks::{DeliveryRecord, EndpointStatus, WebhookEndpoint};
use tokio::sync::RwLock;

use crate::error::{StoreError, DELIVERY_ENTITY, ENDPOINT_ENTITY};
use crate::store::EndpointStore;

#[derive(Default)]
struct Inner {
    endpoints: HashMap<EntityId, WebhookEndpoint>,
    /// Endpoint ids in creation order.
    endpoint_order: Vec<EntityId>,
    deliveries: HashMap<EntityId, DeliveryRecord>,
    /// Delivery ids per endpoint in append order.
    deliveries_by_endpoint: HashMap<EntityId, Vec<EntityId>>,
}

/// Reference store. Every mutation happens under the write lock, so
/// concurrent appends cannot interleave or be lost.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delivery records held across all endpoints.
    pub async fn delivery_count(&self) -> usize {
        self.inner.read().await.deliveries.len()
    }
}

#[async_trait]
impl EndpointStore for MemoryStore {
    async fn create_endpoint(
        &self,
        endpoint: WebhookEndpoint,
    ) -> Result<WebhookEndpoint, StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        match inner.endpoints.entry(endpoint.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                entity: ENDPOINT_ENTITY,
                id: endpoint.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(endpoint.clone());
                inner.endpoint_order.push(endpoint.id);
                Ok(endpoint)
            }
        }
    }

    async fn get_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, StoreError> {
        self.inner
            .read()
            .await
            .endpoints
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::endpoint_not_found(id))
    }

    async fn list_endpoints(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<WebhookEndpoint>, StoreError> {
        let all = self.endpoints_for_tenant(tenant_id).await?;
        Ok(Page::from_ordered(all, limit, offset))
    }

    async fn endpoints_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<WebhookEndpoint>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .endpoint_order
            .iter()
            .rev()
            .filter_map(|id| inner.endpoints.get(id))
            .filter(|ep| ep.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: EntityId,
        status: EndpointStatus,
    ) -> Result<WebhookEndpoint, StoreError> {
        let mut inner = self.inner.write().await;
        let endpoint = inner
            .endpoints
            .get_mut(&id)
            .ok_or_else(|| StoreError::endpoint_not_found(id))?;
        endpoint.status = status;
        Ok(endpoint.clone())
    }

    async fn delete_endpoint(&self, id: EntityId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.endpoints.remove(&id).is_none() {
            return Err(StoreError::endpoint_not_found(id));
        }
        inner.endpoint_order.retain(|existing| *existing != id);
        Ok(())
    }

    async fn append_delivery(&self, record: DeliveryRecord) -> Result<DeliveryRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.deliveries.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                entity: DELIVERY_ENTITY,
                id: record.id,
            });
        }
        inner
            .deliveries_by_endpoint
            .entry(record.endpoint_id)
            .or_default()
            .push(record.id);
        inner.deliveries.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_deliveries(
        &self,
        endpoint_id: EntityId,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DeliveryRecord>, StoreError> {
        let inner = self.inner.read().await;
        let all: Vec<DeliveryRecord> = inner
            .deliveries_by_endpoint
            .get(&endpoint_id)
            .map(|ids| {
                ids.iter()
                    .rev()
                    .filter_map(|id| inner.deliveries.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Page::from_ordered(all, limit, offset))
    }

    async fn get_delivery(&self, id: EntityId) -> Result<DeliveryRecord, StoreError> {
        self.inner
            .read()
            .await
            .deliveries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::delivery_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use carehook_core::types::new_id;
    use carehook_core::webhooks::{AttemptOutcome, DeliveryStatus};
    use chrono::Utc;

    use super::*;

    fn endpoint(tenant: &str) -> WebhookEndpoint {
        WebhookEndpoint {
            id: new_id(),
            url: "https://hooks.example.com/fhir".into(),
            secret: "secret".into(),
            tenant_id: tenant.into(),
            client_id: "client".into(),
            events: vec!["Patient.create".into()],
            status: EndpointStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn record(endpoint_id: EntityId, attempt: i32) -> DeliveryRecord {
        DeliveryRecord::from_attempt(
            endpoint_id,
            new_id(),
            "Patient.create",
            attempt,
            b"{}".to_vec(),
            AttemptOutcome {
                status: DeliveryStatus::Success,
                status_code: 200,
                response_body: String::new(),
                error: None,
                duration_ms: 1,
            },
        )
    }

    #[tokio::test]
    async fn get_unknown_endpoint_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            store.get_endpoint(new_id()).await,
            Err(StoreError::NotFound { entity: ENDPOINT_ENTITY, .. })
        );
    }

    #[tokio::test]
    async fn get_unknown_delivery_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            store.get_delivery(new_id()).await,
            Err(StoreError::NotFound { entity: DELIVERY_ENTITY, .. })
        );
    }

    #[tokio::test]
    async fn duplicate_endpoint_id_is_rejected() {
        let store = MemoryStore::new();
        let ep = endpoint("t1");
        store.create_endpoint(ep.clone()).await.unwrap();
        assert_matches!(
            store.create_endpoint(ep).await,
            Err(StoreError::Duplicate { .. })
        );
    }

    #[tokio::test]
    async fn list_endpoints_is_tenant_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_endpoint(endpoint("t1")).await.unwrap();
        store.create_endpoint(endpoint("t2")).await.unwrap();
        let second = store.create_endpoint(endpoint("t1")).await.unwrap();
        let third = store.create_endpoint(endpoint("t1")).await.unwrap();

        let page = store.list_endpoints("t1", 2, 0).await.unwrap();
        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![third.id, second.id]);

        let rest = store.list_endpoints("t1", 2, 2).await.unwrap();
        assert_eq!(rest.total, 3);
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].id, first.id);
    }

    #[tokio::test]
    async fn update_status_flips_and_persists() {
        let store = MemoryStore::new();
        let ep = store.create_endpoint(endpoint("t1")).await.unwrap();

        let paused = store.update_status(ep.id, EndpointStatus::Paused).await.unwrap();
        assert_eq!(paused.status, EndpointStatus::Paused);
        assert_eq!(
            store.get_endpoint(ep.id).await.unwrap().status,
            EndpointStatus::Paused
        );

        assert_matches!(
            store.update_status(new_id(), EndpointStatus::Active).await,
            Err(StoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn delete_keeps_delivery_history() {
        let store = MemoryStore::new();
        let ep = store.create_endpoint(endpoint("t1")).await.unwrap();
        let rec = store.append_delivery(record(ep.id, 1)).await.unwrap();

        store.delete_endpoint(ep.id).await.unwrap();

        assert!(store.get_endpoint(ep.id).await.unwrap_err().is_not_found());
        assert!(store.list_endpoints("t1", 10, 0).await.unwrap().items.is_empty());
        assert_eq!(store.get_delivery(rec.id).await.unwrap().id, rec.id);
        assert_matches!(
            store.delete_endpoint(ep.id).await,
            Err(StoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn deliveries_are_newest_first_with_total() {
        let store = MemoryStore::new();
        let ep = new_id();
        let mut ids = Vec::new();
        for attempt in 1..=5 {
            ids.push(store.append_delivery(record(ep, attempt)).await.unwrap().id);
        }
        store.append_delivery(record(new_id(), 1)).await.unwrap();

        let page = store.list_deliveries(ep, 2, 1).await.unwrap();
        assert_eq!(page.total, 5);
        let got: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[3], ids[2]]);
    }

    #[tokio::test]
    async fn unknown_endpoint_has_empty_log() {
        let store = MemoryStore::new();
        let page = store.list_deliveries(new_id(), 10, 0).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let ep = new_id();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.append_delivery(record(ep, 1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let page = store.list_deliveries(ep, 100, 0).await.unwrap();
        assert_eq!(page.total, 20);
        assert_eq!(page.items.len(), 20);
        assert_eq!(store.delivery_count().await, 20);
    }
}
