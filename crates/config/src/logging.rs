//! Logging configuration
//!
//! Controls the tracing subscriber the pipeline installs at startup. The
//! filter is a tracing directive string, so per-crate levels work the same
//! way they do through `RUST_LOG` - useful for turning a single noisy
//! sender up to debug without drowning the rest of the pipeline.

use serde::Deserialize;

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// filter = "info,ferry_sender=debug"
/// json = false
/// stderr = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Tracing filter directives, e.g. `"info"` or
    /// `"warn,ferry_sender=trace"`. `RUST_LOG` takes precedence when set.
    /// Default: info
    pub filter: String,

    /// Emit JSON lines instead of human-readable console output.
    /// Default: false
    pub json: bool,

    /// Write to stderr instead of stdout.
    /// Default: false
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
            stderr: false,
        }
    }
}

impl LogConfig {
    /// Install a global tracing subscriber matching this configuration.
    ///
    /// `RUST_LOG` overrides the configured filter when set. Returns quietly
    /// if a subscriber is already installed (tests set their own).
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.filter));

        let builder = tracing_subscriber::fmt().with_env_filter(filter);

        let result = match (self.json, self.stderr) {
            (true, true) => builder.json().with_writer(std::io::stderr).try_init(),
            (true, false) => builder.json().try_init(),
            (false, true) => builder.with_writer(std::io::stderr).try_init(),
            (false, false) => builder.try_init(),
        };

        if let Err(e) = result {
            tracing::debug!(error = %e, "tracing subscriber already installed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "info");
        assert!(!config.json);
        assert!(!config.stderr);
    }

    #[test]
    fn test_deserialize() {
        let config: LogConfig = toml::from_str(
            r#"
            filter = "debug,ferry_sender=trace"
            json = true
            stderr = true
            "#,
        )
        .unwrap();

        assert_eq!(config.filter, "debug,ferry_sender=trace");
        assert!(config.json);
        assert!(config.stderr);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: LogConfig = toml::from_str("json = true").unwrap();
        assert!(config.json);
        assert_eq!(config.filter, "info");
        assert!(!config.stderr);
    }
}
