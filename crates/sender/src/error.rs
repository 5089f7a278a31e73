//! Sender error taxonomy

use ferry_encode::EncodeError;
use thiserror::Error;

/// Convenience alias for sink and sender operations.
pub type Result<T> = std::result::Result<T, SenderError>;

/// Errors surfaced on the delivery path.
///
/// None of these stop the pipeline: the engine converts each into
/// statistics, a log line and a terminal failure for the affected events.
/// The exception is [`SenderError::Fatal`], which tears the sender down.
#[derive(Debug, Error)]
pub enum SenderError {
    /// The sink reported a delivery failure.
    #[error("send failed: {0}")]
    Send(String),

    /// The encoder or filter failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The sender is shutting down.
    #[error("sender is closed")]
    Closed,

    /// The sink does not implement the capability the mode requires.
    #[error("{0} is not supported by this sink")]
    Unsupported(&'static str),

    /// Unrecoverable condition; the sender tears itself down.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// Anything outside the taxonomy; recorded and survived.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SenderError {
    /// Create a send error from any displayable reason.
    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }

    /// Create a fatal error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Create an unexpected error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Whether this error should tear the sender down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Errors raised while starting a sender.
#[derive(Debug, Error)]
pub enum StartError {
    /// The sink does not encode for itself and no encoder was supplied.
    #[error("sender {0}: missing encoder")]
    MissingEncoder(String),

    /// The encoder rejected its configuration.
    #[error("sender {sender}: encoder rejected configuration: {source}")]
    InvalidEncoder {
        /// The sender being started.
        sender: String,
        /// The encoder's complaint.
        #[source]
        source: EncodeError,
    },

    /// The sender configuration is out of range.
    #[error(transparent)]
    Config(#[from] ferry_config::ConfigError),
}
