// crates/notify-server/src/metrics.rs
// ============================================================================
// Module: Prometheus Metrics
// Description: Gauge registry refreshed from counters at scrape time.
// Purpose: Expose outcome tallies and queue depth in text exposition format.
// Dependencies: prometheus, notify-core
// ============================================================================

//! ## Overview
//! Tallies live in the counter store, so gauges are set from a fresh
//! [`StatusSnapshot`] on every scrape instead of being incremented inline.

use notify_core::Platform;
use notify_core::StatusSnapshot;
use prometheus::Encoder;
use prometheus::IntGauge;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;

/// Gauge set backing the metrics endpoint.
pub struct PushMetrics {
    registry: Registry,
    total: IntGauge,
    success: IntGaugeVec,
    error: IntGaugeVec,
    queue_usage: IntGauge,
    in_flight: IntGauge,
}

impl PushMetrics {
    /// Creates and registers every gauge.
    ///
    /// # Errors
    ///
    /// Returns [`prometheus::Error`] when a gauge cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let total = IntGauge::new("notify_total_push_count", "Total processed notifications")?;
        let success = IntGaugeVec::new(
            Opts::new("notify_push_success_count", "Successful deliveries per platform"),
            &["platform"],
        )?;
        let error = IntGaugeVec::new(
            Opts::new("notify_push_error_count", "Failed deliveries per platform"),
            &["platform"],
        )?;
        let queue_usage = IntGauge::new("notify_queue_usage", "Batches waiting for a worker")?;
        let in_flight = IntGauge::new("notify_in_flight", "Batches being processed")?;
        registry.register(Box::new(total.clone()))?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(error.clone()))?;
        registry.register(Box::new(queue_usage.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;
        Ok(Self {
            registry,
            total,
            success,
            error,
            queue_usage,
            in_flight,
        })
    }

    /// Sets every gauge and renders the exposition text.
    ///
    /// # Errors
    ///
    /// Returns [`prometheus::Error`] when encoding fails.
    pub fn render(
        &self,
        snapshot: &StatusSnapshot,
        queue_usage: usize,
        in_flight: usize,
    ) -> Result<String, prometheus::Error> {
        self.total.set(snapshot.total_count);
        for platform in Platform::ALL {
            let tally = snapshot.platform(platform);
            self.success.with_label_values(&[platform.as_str()]).set(tally.push_success);
            self.error.with_label_values(&[platform.as_str()]).set(tally.push_error);
        }
        self.queue_usage.set(i64::try_from(queue_usage).unwrap_or(i64::MAX));
        self.in_flight.set(i64::try_from(in_flight).unwrap_or(i64::MAX));

        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    /// Content type of [`PushMetrics::render`] output.
    #[must_use]
    pub fn content_type() -> String {
        TextEncoder::new().format_type().to_string()
    }
}
