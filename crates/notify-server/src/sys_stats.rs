// crates/notify-server/src/sys_stats.rs
// ============================================================================
// Module: Request Statistics
// Description: Per-status request counters collected by a middleware layer.
// Purpose: Back the system status endpoint.
// Dependencies: axum, serde
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

/// Request counters since process start.
#[derive(Debug)]
pub struct RequestStats {
    started: Instant,
    status_codes: Mutex<BTreeMap<u16, u64>>,
}

/// Serializable view of [`RequestStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestStatsSnapshot {
    /// Requests answered.
    pub total_requests: u64,
    /// Requests answered per status code.
    pub status_codes: BTreeMap<String, u64>,
    /// Seconds since the stats were created.
    pub uptime_seconds: u64,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStats {
    /// Starts counting from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            status_codes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Records one answered request.
    pub fn record(&self, status: u16) {
        if let Ok(mut codes) = self.status_codes.lock() {
            *codes.entry(status).or_insert(0) += 1;
        }
    }

    /// Returns the current counts.
    #[must_use]
    pub fn snapshot(&self) -> RequestStatsSnapshot {
        let codes = self.status_codes.lock().map(|codes| codes.clone()).unwrap_or_default();
        RequestStatsSnapshot {
            total_requests: codes.values().sum(),
            status_codes: codes.into_iter().map(|(code, count)| (code.to_string(), count)).collect(),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

/// Middleware recording the status of every response.
pub async fn track_requests(
    State(stats): State<Arc<RequestStats>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    stats.record(response.status().as_u16());
    response
}
