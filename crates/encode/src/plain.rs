//! Plain encoder - raw payload plus a record terminator

use crate::{EncodeError, Encoder};

/// Passes the payload through unchanged, appending a record terminator.
///
/// The default terminator is a newline, producing line-oriented output
/// suitable for plaintext sinks.
#[derive(Debug, Clone)]
pub struct PlainEncoder {
    terminator: Vec<u8>,
}

impl PlainEncoder {
    /// Create a plain encoder with a custom terminator.
    ///
    /// An empty terminator is valid and yields pure concatenation.
    pub fn new(terminator: impl Into<Vec<u8>>) -> Self {
        Self {
            terminator: terminator.into(),
        }
    }

    /// The configured record terminator.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }
}

impl Default for PlainEncoder {
    fn default() -> Self {
        Self::new(&b"\n"[..])
    }
}

impl Encoder for PlainEncoder {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(payload.len() + self.terminator.len());
        out.extend_from_slice(payload);
        out.extend_from_slice(&self.terminator);
        Ok(out)
    }
}
