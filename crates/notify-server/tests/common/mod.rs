// crates/notify-server/tests/common/mod.rs
// =============================================================================
// Module: Server Test Helpers
// Description: Recording batch sink and router request helpers.
// Purpose: Drive the ingress router in-process with tower oneshot.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;

use axum::Router;
use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use http_body_util::BodyExt;
use notify_config::NotifyConfig;
use notify_core::InMemoryCounterStore;
use notify_core::NotificationBatch;
use notify_core::SharedCounterStore;
use notify_server::AppState;
use notify_server::BatchSink;
use notify_server::DispatchError;
use notify_server::build_router;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

/// Sink that records batches instead of dispatching them.
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<NotificationBatch>>,
    /// Error returned by every enqueue when set.
    pub reject_with: Option<DispatchError>,
    pub capacity: usize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            capacity: 16,
            ..Self::default()
        })
    }

    pub fn rejecting(err: DispatchError) -> Arc<Self> {
        Arc::new(Self {
            reject_with: Some(err),
            capacity: 16,
            ..Self::default()
        })
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(NotificationBatch::len).collect()
    }
}

impl BatchSink for RecordingSink {
    fn enqueue(&self, batch: NotificationBatch) -> Result<(), DispatchError> {
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }

    fn queue_usage(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn in_flight(&self) -> usize {
        0
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

/// Router plus the collaborators a test inspects.
pub struct Harness {
    pub router: Router,
    pub sink: Arc<RecordingSink>,
    pub store: InMemoryCounterStore,
    pub config: Arc<NotifyConfig>,
}

/// Builds a router with `max_notification` and a recording sink.
pub fn harness(max_notification: usize) -> Harness {
    harness_with(max_notification, RecordingSink::new())
}

pub fn harness_with(max_notification: usize, sink: Arc<RecordingSink>) -> Harness {
    let mut config = NotifyConfig::default();
    config.core.max_notification = max_notification;
    harness_from_config(config, sink)
}

pub fn harness_from_config(config: NotifyConfig, sink: Arc<RecordingSink>) -> Harness {
    let config = Arc::new(config);
    let store = InMemoryCounterStore::new();
    let state = AppState::new(
        Arc::clone(&config),
        Arc::clone(&sink) as Arc<dyn BatchSink>,
        SharedCounterStore::from_store(store.clone()),
    )
    .unwrap();
    Harness {
        router: build_router(state),
        sink,
        store,
        config,
    }
}

/// Builds a push body with `count` notifications.
pub fn push_body(count: usize) -> Value {
    let notifications: Vec<Value> = (0 .. count)
        .map(|idx| {
            json!({
                "platform": "ios",
                "tokens": [format!("token-{idx}")],
                "message": "hello"
            })
        })
        .collect();
    json!({ "notifications": notifications })
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<String>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    let request = builder.body(body.map_or_else(Body::empty, Body::from)).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response {
    send(router, Method::GET, uri, None).await
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> Response {
    send(router, Method::POST, uri, Some(body.to_string())).await
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub async fn status_and_json(response: Response) -> (StatusCode, Value) {
    (response.status(), body_json(response).await)
}
