use std::sync::Arc;

use carehook_events::{EventBus, WebhookManager};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Endpoint lifecycle and delivery engine.
    pub manager: WebhookManager,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Bus feeding the webhook dispatcher.
    pub event_bus: Arc<EventBus>,
}
