//! Single-attempt signed webhook POST.
//!
//! [`DeliveryExecutor::send`] never returns an error: every way an attempt
//! can end is classified into an [`AttemptOutcome`].
//!
//! | Result                     | status  | status_code | body     |
//! |----------------------------|---------|-------------|----------|
//! | 2xx response               | success | code        | captured |
//! | non-2xx response           | failed  | code        | captured |
//! | DNS / connect / timeout    | failed  | 0           | empty    |

use std::error::Error as _;
use std::time::{Duration, Instant};

use carehook_core::signing;
use carehook_core::types::EntityId;
use carehook_core::webhooks::{AttemptOutcome, DeliveryStatus, WebhookEndpoint, WebhookEvent};
use chrono::{SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;

use super::{EVENT_HEADER, ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::WebhookError;

/// Default timeout for a single delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on the captured response body.
pub const DEFAULT_MAX_RESPONSE_BODY_BYTES: usize = 4096;

const USER_AGENT: &str = concat!("carehook/", env!("CARGO_PKG_VERSION"));

/// Tunables for the outbound HTTP client.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Whole-request timeout (connect, send, receive headers and body).
    pub timeout: Duration,
    /// Response bodies longer than this are truncated.
    pub max_response_body_bytes: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_response_body_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
        }
    }
}

/// What goes on the wire for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub event_id: EntityId,
    pub event_type: String,
    pub payload: Vec<u8>,
}

impl From<&WebhookEvent> for OutboundMessage {
    fn from(event: &WebhookEvent) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type.clone(),
            payload: event.payload.clone(),
        }
    }
}

/// Sends signed webhook requests. Cheap to clone (the HTTP client is
/// reference-counted internally).
#[derive(Debug, Clone)]
pub struct DeliveryExecutor {
    client: reqwest::Client,
    config: ExecutorConfig,
}

impl DeliveryExecutor {
    /// Build an executor with its own HTTP client.
    ///
    /// Redirects are not followed: a 3xx is reported as a failed delivery.
    pub fn new(config: ExecutorConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Perform one POST of `message` to `endpoint.url`.
    pub async fn send(&self, endpoint: &WebhookEndpoint, message: &OutboundMessage) -> AttemptOutcome {
        let started = Instant::now();
        let signature = signing::signature_header(&message.payload, &endpoint.secret);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let result = self
            .client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp)
            .header(ID_HEADER, message.event_id.to_string())
            .header(EVENT_HEADER, message.event_type.as_str())
            .body(message.payload.clone())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return AttemptOutcome {
                    status: DeliveryStatus::Failed,
                    status_code: 0,
                    response_body: String::new(),
                    error: Some(describe_transport_error(&e, self.config.timeout)),
                    duration_ms: elapsed_ms(started),
                };
            }
        };

        let code = response.status();
        let body = read_bounded(response, self.config.max_response_body_bytes).await;

        let (status, error) = if code.is_success() {
            (DeliveryStatus::Success, None)
        } else {
            (
                DeliveryStatus::Failed,
                Some(format!("endpoint returned HTTP {}", code.as_u16())),
            )
        };

        AttemptOutcome {
            status,
            status_code: code.as_u16(),
            response_body: body,
            error,
            duration_ms: elapsed_ms(started),
        }
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// Flatten a reqwest error and its source chain into one line, e.g.
/// `error sending request for url (...): client error (Connect): tcp connect
/// error: Connection refused`.
fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    let mut message = if err.is_timeout() {
        format!("request timed out after {}ms: {err}", timeout.as_millis())
    } else {
        err.to_string()
    };

    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Read at most `limit` bytes of the response body.
///
/// A body that fails mid-stream keeps whatever arrived before the failure.
async fn read_bounded(mut response: reqwest::Response, limit: usize) -> String {
    let mut buf: Vec<u8> = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let remaining = limit.saturating_sub(buf.len());
                if chunk.len() >= remaining {
                    buf.extend_from_slice(&chunk[..remaining]);
                    break;
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read webhook response body");
                break;
            }
        }
    }
    utf8_prefix(buf)
}

/// Decode as UTF-8, dropping a multi-byte character cut by truncation.
///
/// NUL is replaced with U+FFFD: PostgreSQL `TEXT` cannot store it.
fn utf8_prefix(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let utf8 = e.utf8_error();
            let bytes = e.into_bytes();
            if utf8.error_len().is_none() {
                String::from_utf8_lossy(&bytes[..utf8.valid_up_to()]).into_owned()
            } else {
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    };
    if text.contains('\0') {
        text.replace('\0', "\u{FFFD}")
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
