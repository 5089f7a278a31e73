//! Ferry - Metrics
//!
//! Per-sender delivery counters and the periodic reporter.
//!
//! # Overview
//!
//! Every sender owns a [`SenderMetrics`]: lock-free counters for delivered
//! and failed events, an `active_batches` gauge, size and duration
//! [`Histogram`]s, and a labeled map of sender error messages. Components
//! expose their metrics to the [`MetricsReporter`] through the
//! [`SenderMetricsProvider`] trait; the reporter collects snapshots at a
//! configured interval and emits them through `tracing`.
//!
//! # Thread Safety
//!
//! All counters are atomics with relaxed ordering - eventually consistent,
//! safe to update from any task.

mod histogram;
mod reporter;
mod sender_metrics;

pub use histogram::{Histogram, HistogramSnapshot};
pub use reporter::{MetricsReporter, MetricsReporterBuilder};
pub use sender_metrics::{SenderMetrics, SenderMetricsSnapshot};

/// Trait for senders to expose their metrics to the reporter.
///
/// The `snapshot()` method is the main requirement - it returns a copy of
/// the current metrics that can be safely used for reporting.
pub trait SenderMetricsProvider: Send + Sync {
    /// Unique name of this sender instance.
    fn sender_name(&self) -> &str;

    /// Get a snapshot of current metrics.
    fn snapshot(&self) -> SenderMetricsSnapshot;
}
