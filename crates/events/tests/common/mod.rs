//! Shared fixtures for carehook-events integration tests.
//!
//! Receivers are wiremock servers; the store is the in-memory reference
//! implementation so no database is needed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use carehook_core::validation::EndpointPolicy;
use carehook_core::webhooks::{NewEndpoint, WebhookEndpoint, WebhookEvent};
use carehook_db::MemoryStore;
use carehook_events::{DeliveryExecutor, ExecutorConfig, WebhookManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TENANT_A: &str = "tenant-a";
pub const TENANT_B: &str = "tenant-b";
pub const SECRET: &str = "whsec_test_secret_key_12345";
pub const HOOK_PATH: &str = "/hook";

/// Manager over a fresh in-memory store. Private hosts are allowed because
/// the mock servers listen on loopback.
pub fn test_manager() -> (WebhookManager, Arc<MemoryStore>) {
    test_manager_with(ExecutorConfig {
        timeout: Duration::from_secs(5),
        ..ExecutorConfig::default()
    })
}

pub fn test_manager_with(config: ExecutorConfig) -> (WebhookManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let executor = DeliveryExecutor::new(config).expect("client builds");
    let manager = WebhookManager::new(
        store.clone(),
        executor,
        EndpointPolicy {
            allow_private_hosts: true,
        },
    );
    (manager, store)
}

pub fn new_endpoint(url: &str, events: &[&str]) -> NewEndpoint {
    NewEndpoint {
        url: url.to_string(),
        secret: Some(SECRET.to_string()),
        tenant_id: TENANT_A.to_string(),
        client_id: "ehr-client".to_string(),
        events: events.iter().map(|e| e.to_string()).collect(),
    }
}

pub async fn register(manager: &WebhookManager, url: &str, events: &[&str]) -> WebhookEndpoint {
    manager
        .register_endpoint(new_endpoint(url, events))
        .await
        .expect("registration succeeds")
}

pub fn patient_created() -> WebhookEvent {
    WebhookEvent::new("Patient", "create", "pat-1", TENANT_A)
        .with_json(&serde_json::json!({"resourceType": "Patient", "id": "pat-1"}))
}

/// Start a server answering every POST to [`HOOK_PATH`] with `status`.
pub async fn server_returning(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

pub fn hook_url(server: &MockServer) -> String {
    format!("{}{HOOK_PATH}", server.uri())
}

/// A loopback URL with nothing listening behind it.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}{HOOK_PATH}")
}

// ---------------------------------------------------------------------------
// CaptureResponder
// ---------------------------------------------------------------------------

/// A received request, reduced to what the tests inspect.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub body: Vec<u8>,
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    pub webhook_id: Option<String>,
    pub event_type: Option<String>,
    pub content_type: Option<String>,
}

/// Records every request and answers with a fixed status and body.
#[derive(Clone)]
pub struct CaptureResponder {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    status: u16,
    body: String,
}

impl CaptureResponder {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            status,
            body: body.to_string(),
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }
}

fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl Respond for CaptureResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.requests.lock().unwrap().push(CapturedRequest {
            body: request.body.clone(),
            signature: header(request, "x-webhook-signature"),
            timestamp: header(request, "x-webhook-timestamp"),
            webhook_id: header(request, "x-webhook-id"),
            event_type: header(request, "x-webhook-event"),
            content_type: header(request, "content-type"),
        });
        ResponseTemplate::new(self.status).set_body_string(self.body.clone())
    }
}
