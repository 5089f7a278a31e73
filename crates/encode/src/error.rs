//! Encoder and filter errors

use thiserror::Error;

/// Errors produced while encoding events.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The encoder rejected its configuration at startup.
    #[error("invalid encoder configuration: {0}")]
    Config(String),

    /// The payload could not be encoded.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// A filter applied to the encoder output failed.
    #[error("filter failed: {0}")]
    Filter(#[from] FilterError),

    /// JSON serialization failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl EncodeError {
    /// Create an encoding error from any displayable reason.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Errors produced by a payload filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter could not process the buffer.
    #[error("{filter}: {reason}")]
    Process {
        /// Filter name.
        filter: &'static str,
        /// Human-readable failure reason.
        reason: String,
    },

    /// I/O error inside the filter (compressors write through `io::Write`).
    #[error("filter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// Create a processing error for the named filter.
    pub fn process(filter: &'static str, reason: impl Into<String>) -> Self {
        Self::Process {
            filter,
            reason: reason.into(),
        }
    }
}
