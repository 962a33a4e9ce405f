use carehook_core::error::CoreError;
use carehook_core::types::EntityId;

/// Entity name used in errors about endpoints.
pub const ENDPOINT_ENTITY: &str = "WebhookEndpoint";

/// Entity name used in errors about delivery records.
pub const DELIVERY_ENTITY: &str = "WebhookDelivery";

/// Error type for [`EndpointStore`](crate::EndpointStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("{entity} with id {id} already exists")]
    Duplicate { entity: &'static str, id: EntityId },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back onto a domain type.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    pub fn endpoint_not_found(id: EntityId) -> Self {
        Self::NotFound {
            entity: ENDPOINT_ENTITY,
            id,
        }
    }

    pub fn delivery_not_found(id: EntityId) -> Self {
        Self::NotFound {
            entity: DELIVERY_ENTITY,
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::Internal(other.to_string()),
        }
    }
}
