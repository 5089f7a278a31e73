//! Configuration errors

use thiserror::Error;

/// Errors raised while parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field value is out of range.
    #[error("sender {sender}: {reason}")]
    Invalid {
        /// The sender instance the field belongs to.
        sender: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl ConfigError {
    /// Create a validation error for the named sender.
    pub fn invalid(sender: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            sender: sender.into(),
            reason: reason.into(),
        }
    }
}
