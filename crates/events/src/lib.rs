//! Webhook fan-out for carehook.
//!
//! - [`DeliveryExecutor`]: one signed HTTP POST, classified into an
//!   [`AttemptOutcome`](carehook_core::webhooks::AttemptOutcome).
//! - [`WebhookManager`]: endpoint lifecycle, concurrent fan-out, retry and
//!   test pings, writing every attempt to the delivery log.
//! - [`EventBus`]: in-process broadcast of [`WebhookEvent`]s so producers
//!   never wait on subscriber HTTP calls.
//! - [`WebhookDispatcher`]: background loop draining the bus into the
//!   manager.
//!
//! [`WebhookEvent`]: carehook_core::webhooks::WebhookEvent

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod manager;

pub use bus::EventBus;
pub use delivery::executor::{DeliveryExecutor, ExecutorConfig, OutboundMessage};
pub use dispatcher::WebhookDispatcher;
pub use error::WebhookError;
pub use manager::WebhookManager;
