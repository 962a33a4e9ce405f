use carehook_core::error::CoreError;
use carehook_db::StoreError;

/// Error type for [`WebhookManager`](crate::WebhookManager) operations.
///
/// Failed deliveries are not errors: they come back as delivery records
/// with `status = failed`.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Validation failures and unknown ids.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store could not complete the operation.
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl WebhookError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::Core(CoreError::NotFound { entity, id }),
            other => Self::Store(other),
        }
    }
}
