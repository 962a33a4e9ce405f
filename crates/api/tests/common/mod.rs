#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use carehook_api::config::{ServerConfig, WebhookSettings};
use carehook_api::router::build_app_router;
use carehook_api::state::AppState;
use carehook_db::MemoryStore;
use carehook_events::{DeliveryExecutor, EventBus, WebhookDispatcher, WebhookManager};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
///
/// Private hosts are allowed so endpoints can point at local mock servers.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        webhooks: WebhookSettings {
            timeout_secs: 5,
            allow_private_hosts: true,
            ..WebhookSettings::default()
        },
    }
}

/// The router plus handles tests use to look behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub manager: WebhookManager,
}

/// Build the full application router over an in-memory store, with the
/// bus dispatcher running. Must be called inside a Tokio runtime.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let executor = DeliveryExecutor::new(config.webhooks.executor_config()).unwrap();
    let manager = WebhookManager::new(
        store.clone(),
        executor,
        config.webhooks.endpoint_policy(),
    );

    let event_bus = Arc::new(EventBus::default());
    tokio::spawn(WebhookDispatcher::run(
        manager.clone(),
        event_bus.subscribe(),
    ));

    let state = AppState {
        manager: manager.clone(),
        config: Arc::new(config.clone()),
        event_bus,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        manager,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an endpoint through the API and return the `data` object.
pub async fn create_endpoint(app: &TestApp, url: &str, events: &[&str]) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/v1/webhooks",
        serde_json::json!({
            "url": url,
            "secret": "whsec_api_test_secret",
            "tenant_id": "tenant-a",
            "client_id": "portal",
            "events": events,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}
