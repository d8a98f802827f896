// crates/notify-server/src/ingress.rs
// ============================================================================
// Module: HTTP Ingress
// Description: Axum routes for push submission, status, config, and metrics.
// Purpose: Validate notification batches and hand them to the dispatch queue.
// Dependencies: axum, notify-config, notify-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`accept_push`] is the whole acceptance contract: decode the body, check
//! the batch bounds, enqueue without waiting. Every client-facing failure is
//! an [`IngressError`] rendered as `{"code": <status>, "message": <text>}`.
//!
//! Route paths come from [`notify_config::ApiConfig`]; the welcome payload is
//! always served at `/`. Every response carries [`VERSION_HEADER`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::from_fn_with_state;
use axum::middleware::map_response;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use notify_config::NotifyConfig;
use notify_core::BatchError;
use notify_core::NotificationBatch;
use notify_core::PushRequest;
use notify_core::SharedCounterStore;
use notify_core::StatusSnapshot;
use notify_core::runtime::status::read_status;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use tracing::error;

use crate::dispatch::BatchSink;
use crate::dispatch::DispatchError;
use crate::error::ServerError;
use crate::metrics::PushMetrics;
use crate::sys_stats::RequestStats;
use crate::sys_stats::RequestStatsSnapshot;
use crate::sys_stats::track_requests;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server version reported in headers and status payloads.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response header carrying [`VERSION`].
pub const VERSION_HEADER: &str = "x-notify-version";

/// Welcome text served at `/`.
pub const WELCOME_TEXT: &str = "Welcome to notification server.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Client-visible ingress failures.
///
/// # Invariants
/// - Messages are returned verbatim to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngressError {
    /// Body is not a JSON object with a `notifications` array.
    #[error("Missing notifications field.")]
    MalformedInput,
    /// Batch has zero items.
    #[error("Notifications field is empty.")]
    EmptyBatch,
    /// Batch exceeds the configured maximum.
    #[error("Number of notifications({submitted}) over limit({limit})")]
    BatchTooLarge {
        /// Submitted item count.
        submitted: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Request body exceeds `core.max_body_bytes`.
    #[error("Request body over limit({limit} bytes)")]
    BodyTooLarge {
        /// Configured maximum in bytes.
        limit: usize,
    },
    /// Dispatch queue has no free slot.
    #[error("Notification queue is full.")]
    QueueFull,
    /// Dispatch queue is shutting down.
    #[error("Notification queue is closed.")]
    QueueClosed,
    /// Server-side failure while rendering a response.
    #[error("{0}")]
    Internal(String),
}

impl IngressError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedInput | Self::EmptyBatch | Self::BatchTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::QueueFull | Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BatchError> for IngressError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Empty => Self::EmptyBatch,
            BatchError::TooLarge {
                submitted,
                limit,
            } => Self::BatchTooLarge {
                submitted,
                limit,
            },
        }
    }
}

impl From<DispatchError> for IngressError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::QueueFull => Self::QueueFull,
            DispatchError::Closed | DispatchError::ShutdownTimeout(_) => Self::QueueClosed,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Acceptance
// ============================================================================

/// Validates a raw push body and enqueues it, returning the item count.
///
/// # Errors
///
/// Returns [`IngressError`] for undecodable, empty, or oversized batches and
/// when the queue rejects the batch. Nothing is enqueued on error.
pub fn accept_push(
    body: &[u8],
    limit: usize,
    sink: &dyn BatchSink,
) -> Result<usize, IngressError> {
    let request: PushRequest = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "push body rejected");
        IngressError::MalformedInput
    })?;
    let batch = NotificationBatch::new(request.notifications, limit).map_err(|err| {
        debug!(error = %err, "push batch rejected");
        IngressError::from(err)
    })?;
    let count = batch.len();
    sink.enqueue(batch).map_err(|err| {
        debug!(error = %err, notifications = count, "push batch not enqueued");
        IngressError::from(err)
    })?;
    debug!(notifications = count, "push batch accepted");
    Ok(count)
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Active configuration.
    pub config: Arc<NotifyConfig>,
    /// Dispatch destination.
    pub queue: Arc<dyn BatchSink>,
    /// Outcome tallies.
    pub store: SharedCounterStore,
    /// Prometheus gauges.
    pub metrics: Arc<PushMetrics>,
    /// Request counters.
    pub requests: Arc<RequestStats>,
}

impl AppState {
    /// Builds handler state with fresh metrics and request counters.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Init`] when the metrics registry cannot be built.
    pub fn new(
        config: Arc<NotifyConfig>,
        queue: Arc<dyn BatchSink>,
        store: SharedCounterStore,
    ) -> Result<Self, ServerError> {
        let metrics = PushMetrics::new().map_err(|err| ServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            queue,
            store,
            metrics: Arc::new(metrics),
            requests: Arc::new(RequestStats::new()),
        })
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the routing table shared by every front door mode.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let api = &config.api;
    Router::new()
        .route("/", get(root))
        .route(&api.push_uri, post(push))
        .route(&api.stat_app_uri, get(stat_app))
        .route(&api.config_uri, get(config_snapshot))
        .route(&api.sys_stat_uri, get(sys_stats))
        .route(&api.metric_uri, get(metrics))
        .route(&api.health_uri, get(health))
        .layer(DefaultBodyLimit::max(config.core.max_body_bytes))
        .layer(from_fn_with_state(Arc::clone(&state.requests), track_requests))
        .layer(map_response(add_version_header))
        .with_state(state)
}

async fn add_version_header(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(HeaderName::from_static(VERSION_HEADER), HeaderValue::from_static(VERSION));
    response
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

async fn root() -> Json<Value> {
    Json(json!({ "text": WELCOME_TEXT }))
}

async fn push(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, IngressError> {
    let body = body.map_err(|rejection| {
        debug!(error = %rejection, "push body rejected");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            IngressError::BodyTooLarge {
                limit: state.config.core.max_body_bytes,
            }
        } else {
            IngressError::MalformedInput
        }
    })?;
    accept_push(&body, state.config.core.max_notification, state.queue.as_ref())?;
    Ok(Json(json!({ "success": "ok" })))
}

async fn config_snapshot(State(state): State<AppState>) -> Result<Response, IngressError> {
    let yaml = state.config.to_yaml().map_err(|err| {
        error!(error = %err, "config snapshot failed");
        IngressError::Internal(err.to_string())
    })?;
    Ok((StatusCode::CREATED, [(CONTENT_TYPE, "application/x-yaml")], yaml).into_response())
}

/// Application status payload.
#[derive(Debug, Serialize)]
struct AppStatus {
    version: &'static str,
    queue_max: usize,
    queue_usage: usize,
    in_flight: usize,
    #[serde(flatten)]
    tallies: StatusSnapshot,
}

async fn stat_app(State(state): State<AppState>) -> Json<AppStatus> {
    let tallies = read_status(&state.store).await;
    Json(AppStatus {
        version: VERSION,
        queue_max: state.queue.queue_capacity(),
        queue_usage: state.queue.queue_usage(),
        in_flight: state.queue.in_flight(),
        tallies,
    })
}

async fn sys_stats(State(state): State<AppState>) -> Json<RequestStatsSnapshot> {
    Json(state.requests.snapshot())
}

async fn metrics(State(state): State<AppState>) -> Result<Response, IngressError> {
    let snapshot = read_status(&state.store).await;
    let text = state
        .metrics
        .render(&snapshot, state.queue.queue_usage(), state.queue.in_flight())
        .map_err(|err| {
            error!(error = %err, "metrics encoding failed");
            IngressError::Internal(err.to_string())
        })?;
    Ok(([(CONTENT_TYPE, PushMetrics::content_type())], text).into_response())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
