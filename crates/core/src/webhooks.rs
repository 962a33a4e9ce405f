//! Webhook endpoint, event and delivery-record types.
//!
//! These are plain data types shared by the store, the delivery engine and
//! the HTTP layer. Behaviour lives next door: signing in
//! [`signing`](crate::signing), pattern matching in
//! [`matching`](crate::matching), input checks in
//! [`validation`](crate::validation).

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{new_id, EntityId, Timestamp};

/// Event type of the synthetic ping sent by the "test endpoint" flow.
pub const TEST_EVENT_TYPE: &str = "webhook.test";

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Lifecycle status of a registered endpoint.
///
/// `Active` endpoints receive fan-out deliveries; `Paused` ones are skipped
/// until resumed. There is no terminal state: deletion removes the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Active,
    Paused,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subscriber registration.
///
/// Only `status` changes after creation. The secret is never serialized;
/// the registration response is the one place it is revealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: EntityId,
    pub url: String,
    #[serde(skip_serializing, default)]
    pub secret: String,
    pub tenant_id: String,
    pub client_id: String,
    /// Subscription patterns, e.g. `"Patient.create"` or `"*.delete"`.
    pub events: Vec<String>,
    pub status: EndpointStatus,
    pub created_at: Timestamp,
}

impl WebhookEndpoint {
    pub fn is_active(&self) -> bool {
        self.status == EndpointStatus::Active
    }
}

/// Input for registering a new endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEndpoint {
    pub url: String,
    /// Signing secret; generated when absent or blank.
    pub secret: Option<String>,
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    pub events: Vec<String>,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A domain-change notification pushed by a producer.
///
/// Events are never persisted by this service; only the delivery records
/// they produce are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: EntityId,
    /// Dot-joined `ResourceType.Action`, e.g. `"Encounter.update"`.
    pub event_type: String,
    pub resource_type: String,
    pub resource_id: String,
    pub tenant_id: String,
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
    pub timestamp: Timestamp,
}

impl WebhookEvent {
    /// Create an event for `resource_type.action` with an empty JSON object
    /// payload.
    pub fn new(
        resource_type: impl Into<String>,
        action: &str,
        resource_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        Self {
            id: new_id(),
            event_type: format!("{resource_type}.{action}"),
            resource_type,
            resource_id: resource_id.into(),
            tenant_id: tenant_id.into(),
            payload: b"{}".to_vec(),
            timestamp: Utc::now(),
        }
    }

    /// Set the raw payload bytes.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the payload to the compact JSON encoding of `value`.
    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_payload(value.to_string())
    }

    /// Build the synthetic ping used to check an endpoint's reachability.
    pub fn test_ping(endpoint: &WebhookEndpoint) -> Self {
        let id = new_id();
        let timestamp = Utc::now();
        let payload = serde_json::json!({
            "event": TEST_EVENT_TYPE,
            "event_id": id,
            "webhook_id": endpoint.id,
            "timestamp": timestamp.to_rfc3339(),
            "message": "This is a test delivery to verify webhook connectivity."
        });
        Self {
            id,
            event_type: TEST_EVENT_TYPE.to_string(),
            resource_type: "webhook".to_string(),
            resource_id: endpoint.id.to_string(),
            tenant_id: endpoint.tenant_id.clone(),
            payload: payload.to_string().into_bytes(),
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery record
// ---------------------------------------------------------------------------

/// Result of one HTTP attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single POST against one endpoint produced.
///
/// `status_code` is `0` when no response was received (DNS failure,
/// refused connection, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub status: DeliveryStatus,
    pub status_code: u16,
    pub response_body: String,
    pub error: Option<String>,
    pub duration_ms: i64,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

/// Immutable audit row for one HTTP attempt against one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: EntityId,
    pub endpoint_id: EntityId,
    /// Sent as `X-Webhook-ID`; kept across retries so receivers can
    /// de-duplicate.
    pub event_id: EntityId,
    pub event_type: String,
    /// 1-based; a retry is `previous.attempt + 1`.
    pub attempt: i32,
    pub status: DeliveryStatus,
    pub status_code: u16,
    pub response_body: String,
    /// Exact bytes sent, kept so a retry re-sends (and re-signs) the same body.
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub timestamp: Timestamp,
}

impl DeliveryRecord {
    /// Build the record for an attempt that has just completed.
    pub fn from_attempt(
        endpoint_id: EntityId,
        event_id: EntityId,
        event_type: &str,
        attempt: i32,
        payload: Vec<u8>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            id: new_id(),
            endpoint_id,
            event_id,
            event_type: event_type.to_string(),
            attempt,
            status: outcome.status,
            status_code: outcome.status_code,
            response_body: outcome.response_body,
            payload,
            error: outcome.error,
            duration_ms: outcome.duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

/// Per-endpoint result of a fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub endpoint_id: EntityId,
    pub record: DeliveryRecord,
    /// `false` when the attempt happened but appending its record failed.
    pub recorded: bool,
}

/// Serialize opaque payload bytes as standard base64 in JSON.
mod payload_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
