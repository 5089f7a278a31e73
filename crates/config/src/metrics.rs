//! Metrics reporting configuration

use std::time::Duration;

use serde::Deserialize;

/// Metrics reporting configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether periodic metrics reporting is enabled.
    /// Default: true
    pub enabled: bool,

    /// Reporting interval in seconds.
    /// Default: 10
    pub interval_secs: u64,
}

impl MetricsConfig {
    /// The reporting interval as a [`Duration`].
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
        }
    }
}
