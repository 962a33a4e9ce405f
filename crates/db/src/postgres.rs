//! PostgreSQL [`EndpointStore`] for the `webhook_endpoints` and
//! `webhook_deliveries` tables.

use async_trait::async_trait;
use carehook_core::pagination::Page;
use carehook_core::types::{EntityId, Timestamp};
use carehook_core::webhooks::{DeliveryRecord, DeliveryStatus, EndpointStatus, WebhookEndpoint};
use sqlx::FromRow;

use crate::error::{StoreError, DELIVERY_ENTITY, ENDPOINT_ENTITY};
use crate::store::EndpointStore;
use crate::DbPool;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const ENDPOINT_COLUMNS: &str = "\
    id, url, secret, tenant_id, client_id, events, status, created_at";

const DELIVERY_COLUMNS: &str = "\
    id, endpoint_id, event_id, event_type, attempt, status, status_code, \
    response_body, payload, error, duration_ms, created_at";

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct EndpointRow {
    id: EntityId,
    url: String,
    secret: String,
    tenant_id: String,
    client_id: String,
    events: Vec<String>,
    status: String,
    created_at: Timestamp,
}

impl TryFrom<EndpointRow> for WebhookEndpoint {
    type Error = StoreError;

    fn try_from(row: EndpointRow) -> Result<Self, Self::Error> {
        let status = EndpointStatus::parse(&row.status).ok_or_else(|| {
            StoreError::InvalidRow(format!("endpoint {} has status '{}'", row.id, row.status))
        })?;
        Ok(Self {
            id: row.id,
            url: row.url,
            secret: row.secret,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            events: row.events,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DeliveryRow {
    id: EntityId,
    endpoint_id: EntityId,
    event_id: EntityId,
    event_type: String,
    attempt: i32,
    status: String,
    status_code: i32,
    response_body: String,
    payload: Vec<u8>,
    error: Option<String>,
    duration_ms: i64,
    created_at: Timestamp,
}

impl TryFrom<DeliveryRow> for DeliveryRecord {
    type Error = StoreError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let status = DeliveryStatus::parse(&row.status).ok_or_else(|| {
            StoreError::InvalidRow(format!("delivery {} has status '{}'", row.id, row.status))
        })?;
        let status_code = u16::try_from(row.status_code).map_err(|_| {
            StoreError::InvalidRow(format!(
                "delivery {} has status code {}",
                row.id, row.status_code
            ))
        })?;
        Ok(Self {
            id: row.id,
            endpoint_id: row.endpoint_id,
            event_id: row.event_id,
            event_type: row.event_type,
            attempt: row.attempt,
            status,
            status_code,
            response_body: row.response_body,
            payload: row.payload,
            error: row.error,
            duration_ms: row.duration_ms,
            timestamp: row.created_at,
        })
    }
}

fn map_insert_error(err: sqlx::Error, entity: &'static str, id: EntityId) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate { entity, id };
        }
    }
    StoreError::Database(err)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// sqlx-backed store; every operation is a single statement, so the
/// database provides the concurrency guarantees.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EndpointStore for PgStore {
    async fn create_endpoint(
        &self,
        endpoint: WebhookEndpoint,
    ) -> Result<WebhookEndpoint, StoreError> {
        let query = format!(
            "INSERT INTO webhook_endpoints \
                 (id, url, secret, tenant_id, client_id, events, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ENDPOINT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EndpointRow>(&query)
            .bind(endpoint.id)
            .bind(&endpoint.url)
            .bind(&endpoint.secret)
            .bind(&endpoint.tenant_id)
            .bind(&endpoint.client_id)
            .bind(&endpoint.events)
            .bind(endpoint.status.as_str())
            .bind(endpoint.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, ENDPOINT_ENTITY, endpoint.id))?;
        row.try_into()
    }

    async fn get_endpoint(&self, id: EntityId) -> Result<WebhookEndpoint, StoreError> {
        let query = format!("SELECT {ENDPOINT_COLUMNS} FROM webhook_endpoints WHERE id = $1");
        sqlx::query_as::<_, EndpointRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::endpoint_not_found(id))?
            .try_into()
    }

    async fn list_endpoints(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<WebhookEndpoint>, StoreError> {
        let query = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM webhook_endpoints \
             WHERE tenant_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, EndpointRow>(&query)
            .bind(tenant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM webhook_endpoints WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        let items = rows
            .into_iter()
            .map(WebhookEndpoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn endpoints_for_tenant(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<WebhookEndpoint>, StoreError> {
        let query = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM webhook_endpoints \
             WHERE tenant_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, EndpointRow>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(WebhookEndpoint::try_from)
            .collect()
    }

    async fn update_status(
        &self,
        id: EntityId,
        status: EndpointStatus,
    ) -> Result<WebhookEndpoint, StoreError> {
        let query = format!(
            "UPDATE webhook_endpoints SET status = $2 WHERE id = $1 \
             RETURNING {ENDPOINT_COLUMNS}"
        );
        sqlx::query_as::<_, EndpointRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::endpoint_not_found(id))?
            .try_into()
    }

    async fn delete_endpoint(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM webhook_endpoints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::endpoint_not_found(id));
        }
        Ok(())
    }

    async fn append_delivery(&self, record: DeliveryRecord) -> Result<DeliveryRecord, StoreError> {
        let query = format!(
            "INSERT INTO webhook_deliveries \
                 (id, endpoint_id, event_id, event_type, attempt, status, status_code, \
                  response_body, payload, error, duration_ms, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {DELIVERY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DeliveryRow>(&query)
            .bind(record.id)
            .bind(record.endpoint_id)
            .bind(record.event_id)
            .bind(&record.event_type)
            .bind(record.attempt)
            .bind(record.status.as_str())
            .bind(i32::from(record.status_code))
            .bind(&record.response_body)
            .bind(&record.payload)
            .bind(record.error.as_deref())
            .bind(record.duration_ms)
            .bind(record.timestamp)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, DELIVERY_ENTITY, record.id))?;
        row.try_into()
    }

    async fn list_deliveries(
        &self,
        endpoint_id: EntityId,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DeliveryRecord>, StoreError> {
        let query = format!(
            "SELECT {DELIVERY_COLUMNS} FROM webhook_deliveries \
             WHERE endpoint_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, DeliveryRow>(&query)
            .bind(endpoint_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM webhook_deliveries WHERE endpoint_id = $1")
                .bind(endpoint_id)
                .fetch_one(&self.pool)
                .await?;

        let items = rows
            .into_iter()
            .map(DeliveryRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn get_delivery(&self, id: EntityId) -> Result<DeliveryRecord, StoreError> {
        let query = format!("SELECT {DELIVERY_COLUMNS} FROM webhook_deliveries WHERE id = $1");
        sqlx::query_as::<_, DeliveryRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::delivery_not_found(id))?
            .try_into()
    }
}
