//! Sender configuration types
//!
//! Tuning for one sender instance: batching, worker pool, flush cadence and
//! the encoder/filter references it resolves at startup.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

/// Default worker-pool size for batched senders.
pub const DEFAULT_WORKERS: usize = 2;

/// Default maximum age of the current batch, in seconds.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;

/// Configuration for a single sender instance.
///
/// Immutable after the sender starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Events per batch. Absent disables batching.
    pub batch_size: Option<usize>,

    /// Worker-pool size when batching.
    /// Default: 2
    pub workers: usize,

    /// Maximum age of the current batch before a forced flush, in seconds.
    /// Default: 5
    pub flush_interval_secs: u64,

    /// Name of the encoder to resolve at startup.
    pub encoder: Option<String>,

    /// Name of the filter to resolve at startup.
    pub filter: Option<String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            workers: DEFAULT_WORKERS,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            encoder: None,
            filter: None,
        }
    }
}

impl SenderConfig {
    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the worker-pool size.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the flush interval.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_secs = interval.as_secs();
        self
    }

    /// The flush interval as a [`Duration`].
    #[inline]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// Whether this configuration enables batching (given a batch-capable
    /// sink).
    #[inline]
    pub fn is_batching(&self) -> bool {
        matches!(self.batch_size, Some(n) if n > 0)
    }

    /// Clamp batch size and workers to at least one.
    ///
    /// Applied when a sink only supports batched delivery, so a
    /// configuration without batching still yields a working pool.
    #[must_use]
    pub fn clamped_for_batch_only(mut self) -> Self {
        self.batch_size = Some(self.batch_size.unwrap_or(1).max(1));
        self.workers = self.workers.max(1);
        self
    }

    /// Validate field ranges.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err(ConfigError::invalid(name, "batch_size must be at least 1"));
            }
            if self.workers == 0 {
                return Err(ConfigError::invalid(
                    name,
                    "workers must be at least 1 when batching",
                ));
            }
        }
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::invalid(
                name,
                "flush_interval_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Container for all configured senders.
///
/// Senders are stored as a map of name to config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendersConfig {
    /// Named sender instances.
    #[serde(flatten)]
    senders: HashMap<String, SenderConfig>,
}

impl SendersConfig {
    /// Get a sender by name.
    pub fn get(&self, name: &str) -> Option<&SenderConfig> {
        self.senders.get(name)
    }

    /// Check if a sender exists.
    pub fn contains(&self, name: &str) -> bool {
        self.senders.contains_key(name)
    }

    /// Iterate over all senders.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SenderConfig)> {
        self.senders.iter()
    }

    /// Number of configured senders.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Check if no senders are configured.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// All sender names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.senders.keys()
    }
}
