//! Metrics collection and exposition.
//!
//! # Metrics
//! - `users_http_requests_total` (counter): requests by method, status
//! - `users_http_request_duration_seconds` (histogram): latency distribution
//! - `users_rate_limited_total` (counter): requests denied by the limiter
//!
//! The facade calls are no-ops until [`init_metrics`] installs the
//! Prometheus recorder. [`RequestStats`] is kept regardless and backs
//! `/debug/vars`.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [("method", method.to_string()), ("status", status.to_string())];
    metrics::counter!("users_http_requests_total", &labels).increment(1);
    metrics::histogram!("users_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("users_rate_limited_total").increment(1);
}

/// Process-lifetime request counters.
#[derive(Debug, Default)]
pub struct RequestStats {
    received: AtomicU64,
    sent: AtomicU64,
    processing_micros: AtomicU64,
    by_status: DashMap<u16, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestStatsSnapshot {
    pub total_requests_received: u64,
    pub total_responses_sent: u64,
    pub total_processing_time_us: u64,
    pub total_responses_sent_by_status: BTreeMap<u16, u64>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_started(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_sent(&self, status: u16, elapsed: Duration) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.processing_micros.fetch_add(micros, Ordering::Relaxed);
        *self.by_status.entry(status).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        RequestStatsSnapshot {
            total_requests_received: self.received.load(Ordering::Relaxed),
            total_responses_sent: self.sent.load(Ordering::Relaxed),
            total_processing_time_us: self.processing_micros.load(Ordering::Relaxed),
            total_responses_sent_by_status: self
                .by_status
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        }
    }
}
