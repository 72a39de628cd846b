//! Basic metrics instrumentation for tracking delivery.
//!
//! Provides counters and duration tracking for submissions and transport sends.
//! Counters live for the whole process; nothing here is per-request state.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector for tracking delivery behaviour.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Submissions that passed validation
    submissions_total: Arc<AtomicU64>,

    /// Submissions rejected by validation
    validation_failures_total: Arc<AtomicU64>,

    /// Individual transport send attempts
    send_attempts_total: Arc<AtomicU64>,

    /// Individual transport send failures (including timeouts)
    send_failures_total: Arc<AtomicU64>,

    /// Messages accepted by a transport
    messages_sent_total: Arc<AtomicU64>,

    /// Deliveries that only succeeded on a fallback transport
    fallbacks_total: Arc<AtomicU64>,

    /// Deliveries where the acknowledgment could not be sent
    partial_deliveries_total: Arc<AtomicU64>,

    /// Deliveries where every transport failed
    deliveries_failed_total: Arc<AtomicU64>,

    /// Total duration of all send attempts in milliseconds
    send_duration_total_ms: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            submissions_total: Arc::new(AtomicU64::new(0)),
            validation_failures_total: Arc::new(AtomicU64::new(0)),
            send_attempts_total: Arc::new(AtomicU64::new(0)),
            send_failures_total: Arc::new(AtomicU64::new(0)),
            messages_sent_total: Arc::new(AtomicU64::new(0)),
            fallbacks_total: Arc::new(AtomicU64::new(0)),
            partial_deliveries_total: Arc::new(AtomicU64::new(0)),
            deliveries_failed_total: Arc::new(AtomicU64::new(0)),
            send_duration_total_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_submission(&self) {
        self.submissions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished send attempt with its duration.
    pub fn record_send(&self, duration: Duration, success: bool) {
        self.send_attempts_total.fetch_add(1, Ordering::Relaxed);
        self.send_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        if success {
            self.messages_sent_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fallback(&self) {
        self.fallbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partial_delivery(&self) {
        self.partial_deliveries_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.deliveries_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submissions_total(&self) -> u64 {
        self.submissions_total.load(Ordering::Relaxed)
    }

    pub fn validation_failures_total(&self) -> u64 {
        self.validation_failures_total.load(Ordering::Relaxed)
    }

    pub fn send_attempts_total(&self) -> u64 {
        self.send_attempts_total.load(Ordering::Relaxed)
    }

    pub fn send_failures_total(&self) -> u64 {
        self.send_failures_total.load(Ordering::Relaxed)
    }

    pub fn messages_sent_total(&self) -> u64 {
        self.messages_sent_total.load(Ordering::Relaxed)
    }

    pub fn fallbacks_total(&self) -> u64 {
        self.fallbacks_total.load(Ordering::Relaxed)
    }

    pub fn partial_deliveries_total(&self) -> u64 {
        self.partial_deliveries_total.load(Ordering::Relaxed)
    }

    pub fn deliveries_failed_total(&self) -> u64 {
        self.deliveries_failed_total.load(Ordering::Relaxed)
    }

    /// Get average send duration in milliseconds.
    pub fn send_duration_avg_ms(&self) -> f64 {
        let total = self.send_duration_total_ms.load(Ordering::Relaxed);
        let count = self.send_attempts_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            submissions_total: self.submissions_total(),
            validation_failures_total: self.validation_failures_total(),
            send_attempts_total: self.send_attempts_total(),
            send_failures_total: self.send_failures_total(),
            messages_sent_total: self.messages_sent_total(),
            fallbacks_total: self.fallbacks_total(),
            partial_deliveries_total: self.partial_deliveries_total(),
            deliveries_failed_total: self.deliveries_failed_total(),
            send_duration_avg_ms: self.send_duration_avg_ms(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub submissions_total: u64,
    pub validation_failures_total: u64,
    pub send_attempts_total: u64,
    pub send_failures_total: u64,
    pub messages_sent_total: u64,
    pub fallbacks_total: u64,
    pub partial_deliveries_total: u64,
    pub deliveries_failed_total: u64,
    pub send_duration_avg_ms: f64,
}

/// Helper for timing a single transport send.
pub struct SendTimer {
    start: Instant,
    metrics: Metrics,
}

impl SendTimer {
    /// Start timing a send.
    pub fn new(metrics: Metrics) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Complete the timing and record the outcome. Returns the elapsed time.
    pub fn complete(self, success: bool) -> Duration {
        let duration = self.start.elapsed();
        self.metrics.record_send(duration, success);
        duration
    }
}
