//! In-process metrics collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for provider latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000, 60000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let last = Self::BUCKET_BOUNDS.len() - 1;
        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(last);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the landing engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Session lifecycle
    pub sessions_started: Counter,
    pub sessions_excluded: Counter,
    pub sessions_ended: Counter,
    pub sessions_swept: Counter,
    pub activity_updates: Counter,
    pub heartbeats: Counter,
    pub unknown_session_calls: Counter,

    // Chat relay
    pub chat_requests: Counter,
    pub chat_out_of_scope: Counter,
    pub chat_failures: Counter,

    // Collaborators
    pub llm_errors: Counter,
    pub geolocation_errors: Counter,
    pub mail_sent: Counter,
    pub mail_errors: Counter,
    pub ledger_write_errors: Counter,

    // Latency histograms
    pub chat_latency_ms: Histogram,
    pub summary_latency_ms: Histogram,
    pub geolocation_latency_ms: Histogram,

    // Gauges
    pub active_sessions: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sessions_started: u64,
    pub sessions_excluded: u64,
    pub sessions_ended: u64,
    pub sessions_swept: u64,
    pub activity_updates: u64,
    pub heartbeats: u64,
    pub unknown_session_calls: u64,
    pub chat_requests: u64,
    pub chat_out_of_scope: u64,
    pub chat_failures: u64,
    pub llm_errors: u64,
    pub geolocation_errors: u64,
    pub mail_sent: u64,
    pub mail_errors: u64,
    pub ledger_write_errors: u64,
    pub chat_latency_mean_ms: f64,
    pub summary_latency_mean_ms: f64,
    pub geolocation_latency_mean_ms: f64,
    pub active_sessions: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            sessions_started: self.sessions_started.get(),
            sessions_excluded: self.sessions_excluded.get(),
            sessions_ended: self.sessions_ended.get(),
            sessions_swept: self.sessions_swept.get(),
            activity_updates: self.activity_updates.get(),
            heartbeats: self.heartbeats.get(),
            unknown_session_calls: self.unknown_session_calls.get(),
            chat_requests: self.chat_requests.get(),
            chat_out_of_scope: self.chat_out_of_scope.get(),
            chat_failures: self.chat_failures.get(),
            llm_errors: self.llm_errors.get(),
            geolocation_errors: self.geolocation_errors.get(),
            mail_sent: self.mail_sent.get(),
            mail_errors: self.mail_errors.get(),
            ledger_write_errors: self.ledger_write_errors.get(),
            chat_latency_mean_ms: self.chat_latency_ms.mean(),
            summary_latency_mean_ms: self.summary_latency_ms.mean(),
            geolocation_latency_mean_ms: self.geolocation_latency_ms.mean(),
            active_sessions: self.active_sessions.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
