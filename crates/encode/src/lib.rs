//! Ferry - Encode
//!
//! Encoder and filter contracts for the outbound stage.
//!
//! # Overview
//!
//! An [`Encoder`] turns an event payload (or a whole batch of payloads) into
//! the byte representation a sink ships downstream. A [`Filter`] is an
//! optional post-processing stage applied to the encoder's output, typically
//! compression. Senders wire both together; a filter failure is surfaced as
//! an encode failure.
//!
//! # Design
//!
//! - **Object-safe traits**: senders hold `Arc<dyn Encoder>` / `Arc<dyn Filter>`
//! - **Batch encoding is lazy**: `encode_batch` receives an iterator so the
//!   caller can feed only the payloads that still matter
//! - **Startup validation**: `Encoder::validate` runs once before the sender
//!   starts accepting events
//!
//! # Example
//!
//! ```ignore
//! let encoder = PlainEncoder::default();
//! let bytes = encoder.encode(b"hello")?;
//! assert_eq!(bytes, b"hello\n");
//! ```

mod error;
mod json;
mod plain;
mod zstd_filter;

pub use error::{EncodeError, FilterError};
pub use json::JsonEncoder;
pub use plain::PlainEncoder;
pub use zstd_filter::ZstdFilter;

/// Turns event payloads into the bytes a sink delivers.
///
/// Implementations must be cheap to call concurrently; encoding happens on
/// the feeder and worker paths.
pub trait Encoder: Send + Sync + 'static {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Validate the encoder configuration before the sender starts.
    ///
    /// The default accepts everything.
    fn validate(&self) -> Result<(), EncodeError> {
        Ok(())
    }

    /// Encode a single event payload.
    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError>;

    /// Encode a sequence of event payloads into one buffer.
    ///
    /// The default concatenates per-event encodings, which is correct for
    /// any record-oriented format.
    fn encode_batch<'a>(
        &self,
        payloads: &mut dyn Iterator<Item = &'a [u8]>,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        for payload in payloads {
            out.extend_from_slice(&self.encode(payload)?);
        }
        Ok(out)
    }
}

/// Optional transformation applied to encoder output.
pub trait Filter: Send + Sync + 'static {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Transform the encoded bytes.
    fn filter(&self, input: Vec<u8>) -> Result<Vec<u8>, FilterError>;
}
