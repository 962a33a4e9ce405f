//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Producers publish [`WebhookEvent`]s and return immediately; the
//! [`WebhookDispatcher`](crate::WebhookDispatcher) drains the channel and
//! performs the HTTP fan-out. Share the bus via `Arc<EventBus>`.

use carehook_core::webhooks::WebhookEvent;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use carehook_core::webhooks::WebhookEvent;
/// use carehook_events::EventBus;
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
///
/// bus.publish(WebhookEvent::new("Patient", "create", "p-1", "tenant-a"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<WebhookEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it; with no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: WebhookEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WebhookEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
