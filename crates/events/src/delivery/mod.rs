//! Outbound HTTP delivery of webhook payloads.
//!
//! The executor performs exactly one attempt per call; retry policy belongs
//! to the [`WebhookManager`](crate::WebhookManager).

pub mod executor;

/// Header carrying `sha256=<hex HMAC of the body>`.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the RFC 3339 send time.
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// Header carrying the event id (stable across retries).
pub const ID_HEADER: &str = "X-Webhook-ID";

/// Header carrying the event type, e.g. `Patient.create`.
pub const EVENT_HEADER: &str = "X-Webhook-Event";
