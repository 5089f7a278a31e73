//! Per-sender delivery metrics

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::{Histogram, HistogramSnapshot};

/// Metrics owned by one sender.
///
/// Counters use relaxed atomics; the labeled error map sits behind a short
/// mutex because error paths are not hot.
#[derive(Debug, Default)]
pub struct SenderMetrics {
    /// Events delivered successfully.
    sent: AtomicU64,

    /// Events that terminally failed without a sink-provided message.
    failed_send: AtomicU64,

    /// Batches currently alive (created, not yet dropped).
    active_batches: AtomicI64,

    /// Errors outside the send/encode taxonomy.
    unhandled_errors: AtomicU64,

    /// Distribution of batch sizes observed at flush time.
    batches_size: Histogram,

    /// Distribution of sink flush durations, in microseconds.
    flush_duration_us: Histogram,

    /// Failures carrying a sink-provided message, counted per message.
    sender_errors: Mutex<HashMap<String, u64>>,
}

impl SenderMetrics {
    /// Create a metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful delivery.
    #[inline]
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a terminal failure without a message.
    #[inline]
    pub fn record_failed(&self) {
        self.failed_send.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failure labeled with the sink's message.
    pub fn record_sender_error(&self, message: &str) {
        let mut errors = self.sender_errors.lock();
        *errors.entry(message.to_owned()).or_insert(0) += 1;
    }

    /// Record an error outside the normal taxonomy.
    #[inline]
    pub fn record_unhandled(&self) {
        self.unhandled_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A batch was created.
    #[inline]
    pub fn batch_opened(&self) {
        self.active_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// A batch was dropped.
    #[inline]
    pub fn batch_closed(&self) {
        self.active_batches.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record the size of a batch handed to a worker.
    #[inline]
    pub fn record_batch_size(&self, size: usize) {
        self.batches_size.record(size as u64);
    }

    /// Record the duration of one sink flush call.
    #[inline]
    pub fn record_flush_duration(&self, duration: Duration) {
        self.flush_duration_us.record(duration.as_micros() as u64);
    }

    // Direct accessors for tests and logging

    /// Delivered event count.
    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Unlabeled failure count.
    #[inline]
    pub fn failed_send(&self) -> u64 {
        self.failed_send.load(Ordering::Relaxed)
    }

    /// Currently alive batches.
    #[inline]
    pub fn active_batches(&self) -> i64 {
        self.active_batches.load(Ordering::Relaxed)
    }

    /// Total labeled failures across all messages.
    pub fn sender_error_total(&self) -> u64 {
        self.sender_errors.lock().values().sum()
    }

    /// Labeled failure count for one message.
    pub fn sender_errors_for(&self, message: &str) -> u64 {
        self.sender_errors.lock().get(message).copied().unwrap_or(0)
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> SenderMetricsSnapshot {
        SenderMetricsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            failed_send: self.failed_send.load(Ordering::Relaxed),
            active_batches: self.active_batches.load(Ordering::Relaxed),
            unhandled_errors: self.unhandled_errors.load(Ordering::Relaxed),
            batches_size: self.batches_size.snapshot(),
            flush_duration_us: self.flush_duration_us.snapshot(),
            sender_errors: self.sender_errors.lock().clone(),
        }
    }
}

/// Point-in-time snapshot of sender metrics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SenderMetricsSnapshot {
    pub sent: u64,
    pub failed_send: u64,
    pub active_batches: i64,
    pub unhandled_errors: u64,
    pub batches_size: HistogramSnapshot,
    pub flush_duration_us: HistogramSnapshot,
    pub sender_errors: HashMap<String, u64>,
}

impl SenderMetricsSnapshot {
    /// Total terminal failures, labeled and unlabeled.
    pub fn failed_total(&self) -> u64 {
        self.failed_send + self.sender_errors.values().sum::<u64>()
    }
}
