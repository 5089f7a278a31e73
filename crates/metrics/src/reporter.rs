//! Periodic metrics reporter
//!
//! Collects snapshots from registered senders at a configured interval and
//! emits them through `tracing`. Spawn [`MetricsReporter::run`] as a task;
//! it stops when the cancellation token fires.

use std::sync::Arc;

use ferry_config::MetricsConfig;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::SenderMetricsProvider;

/// Builder for constructing a [`MetricsReporter`].
#[derive(Default)]
pub struct MetricsReporterBuilder {
    config: Option<MetricsConfig>,
    senders: Vec<Arc<dyn SenderMetricsProvider>>,
}

impl MetricsReporterBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reporter configuration.
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a sender metrics provider.
    pub fn sender(mut self, provider: Arc<dyn SenderMetricsProvider>) -> Self {
        self.senders.push(provider);
        self
    }

    /// Register multiple sender metrics providers.
    pub fn senders(mut self, providers: Vec<Arc<dyn SenderMetricsProvider>>) -> Self {
        self.senders.extend(providers);
        self
    }

    /// Build the reporter.
    pub fn build(self) -> MetricsReporter {
        MetricsReporter {
            config: self.config.unwrap_or_default(),
            senders: self.senders,
        }
    }
}

/// Periodic reporter over all registered senders.
pub struct MetricsReporter {
    config: MetricsConfig,
    senders: Vec<Arc<dyn SenderMetricsProvider>>,
}

impl MetricsReporter {
    /// Create a new builder.
    pub fn builder() -> MetricsReporterBuilder {
        MetricsReporterBuilder::new()
    }

    /// Number of registered providers.
    pub fn sender_count(&self) -> usize {
        self.senders.len()
    }

    /// Run the reporter until cancellation.
    ///
    /// This is the main entry point - spawn this as a tokio task.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval_secs,
            senders = self.senders.len(),
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.report();
                    info!("metrics reporter stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Emit one report line per sender.
    fn report(&self) {
        for provider in &self.senders {
            let s = provider.snapshot();
            info!(
                sender = provider.sender_name(),
                sent = s.sent,
                failed_send = s.failed_send,
                sender_errors = s.sender_errors.values().sum::<u64>(),
                active_batches = s.active_batches,
                batches_flushed = s.batches_size.count,
                mean_batch_size = s.batches_size.mean(),
                mean_flush_us = s.flush_duration_us.mean(),
                "sender metrics"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SenderMetrics, SenderMetricsSnapshot};

    struct FixedProvider {
        name: String,
        metrics: SenderMetrics,
    }

    impl SenderMetricsProvider for FixedProvider {
        fn sender_name(&self) -> &str {
            &self.name
        }

        fn snapshot(&self) -> SenderMetricsSnapshot {
            self.metrics.snapshot()
        }
    }

    #[test]
    fn test_builder_registers_providers() {
        let provider = Arc::new(FixedProvider {
            name: "test".into(),
            metrics: SenderMetrics::new(),
        });

        let reporter = MetricsReporter::builder()
            .config(MetricsConfig::default())
            .sender(provider)
            .build();

        assert_eq!(reporter.sender_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_reporter_returns_immediately() {
        let reporter = MetricsReporter::builder()
            .config(MetricsConfig {
                enabled: false,
                interval_secs: 1,
            })
            .build();

        // Completes without the token ever being cancelled.
        reporter.run(CancellationToken::new()).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_stops_on_cancel() {
        let provider = Arc::new(FixedProvider {
            name: "test".into(),
            metrics: SenderMetrics::new(),
        });
        let reporter = MetricsReporter::builder().sender(provider).build();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(reporter.run(cancel.clone()));

        tokio::time::advance(std::time::Duration::from_secs(30)).await;
        cancel.cancel();
        handle.await.unwrap();
    }
}
