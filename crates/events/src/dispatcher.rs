//! Background loop that feeds bus events into the manager.

use carehook_core::webhooks::WebhookEvent;
use tokio::sync::broadcast;

use crate::manager::WebhookManager;

/// Drains an [`EventBus`](crate::EventBus) subscription into
/// [`WebhookManager::deliver`].
pub struct WebhookDispatcher;

impl WebhookDispatcher {
    /// Run until the bus is dropped.
    ///
    /// Each event is handed to its own task so one slow fan-out does not
    /// hold back the next event.
    pub async fn run(manager: WebhookManager, mut receiver: broadcast::Receiver<WebhookEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let manager = manager.clone();
                    tokio::spawn(async move {
                        if let Err(e) = manager.deliver(&event).await {
                            tracing::error!(
                                event_id = %event.id,
                                event_type = %event.event_type,
                                tenant_id = %event.tenant_id,
                                error = %e,
                                "Failed to fan out event",
                            );
                        }
                    });
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Webhook dispatcher lagged, events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, webhook dispatcher shutting down");
                    break;
                }
            }
        }
    }
}
