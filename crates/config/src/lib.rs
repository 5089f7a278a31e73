//! Ferry - Config
//!
//! Typed configuration for the outbound stage.
//!
//! Senders are named instances, allowing multiple senders of the same type
//! with different tuning. Parsing is TOML with serde defaults; every field
//! has a sensible default so an empty table is valid.
//!
//! # Example
//!
//! ```toml
//! [log]
//! filter = "info,ferry_sender=debug"
//!
//! [metrics]
//! interval_secs = 10
//!
//! [senders.bulk]
//! batch_size = 500
//! workers = 4
//! encoder = "json"
//! filter = "zstd"
//!
//! [senders.debug]
//! # unbatched, all defaults
//! ```

mod error;
mod logging;
mod metrics;
mod sender;

pub use error::ConfigError;
pub use logging::LogConfig;
pub use metrics::MetricsConfig;
pub use sender::{SenderConfig, SendersConfig, DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_WORKERS};

use serde::Deserialize;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging behavior.
    pub log: LogConfig,

    /// Metrics reporting.
    pub metrics: MetricsConfig,

    /// Named sender instances.
    pub senders: SendersConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, sender) in self.senders.iter() {
            sender.validate(name)?;
        }
        Ok(())
    }
}
