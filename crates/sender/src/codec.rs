//! Codec - encoder and filter wired together
//!
//! The sender owns the codec and hands it to the sink on every delivery
//! call, so sinks encode at whatever granularity suits their wire format.
//! A filter failure surfaces as an encode failure.

use std::sync::Arc;

use ferry_encode::{EncodeError, Encoder, Filter};

use crate::batch::Batch;
use crate::event::Event;

/// Optional encoder plus optional filter, applied in that order.
#[derive(Clone, Default)]
pub struct Codec {
    encoder: Option<Arc<dyn Encoder>>,
    filter: Option<Arc<dyn Filter>>,
}

impl Codec {
    /// Create a codec from its parts.
    pub fn new(encoder: Option<Arc<dyn Encoder>>, filter: Option<Arc<dyn Filter>>) -> Self {
        Self { encoder, filter }
    }

    /// Whether an encoder is configured.
    #[inline]
    pub fn has_encoder(&self) -> bool {
        self.encoder.is_some()
    }

    /// Run the encoder's startup validation.
    pub(crate) fn validate(&self) -> Result<(), EncodeError> {
        match &self.encoder {
            Some(encoder) => encoder.validate(),
            None => Ok(()),
        }
    }

    /// Encode one event and apply the filter.
    pub fn encode_event(&self, event: &Event) -> Result<Vec<u8>, EncodeError> {
        let encoder = self.require_encoder()?;
        let bytes = encoder.encode(event.payload())?;
        self.apply_filter(bytes)
    }

    /// Encode the pending events of a batch into one buffer and apply the
    /// filter.
    ///
    /// Futures settled before the flush (for instance by shutdown) are not
    /// encoded.
    pub fn encode_batch(&self, batch: &Batch) -> Result<Vec<u8>, EncodeError> {
        let encoder = self.require_encoder()?;
        let mut payloads = batch.pending().map(|future| future.event().payload().as_ref());
        let bytes = encoder.encode_batch(&mut payloads)?;
        self.apply_filter(bytes)
    }

    fn require_encoder(&self) -> Result<&Arc<dyn Encoder>, EncodeError> {
        self.encoder
            .as_ref()
            .ok_or_else(|| EncodeError::config("no encoder configured"))
    }

    fn apply_filter(&self, bytes: Vec<u8>) -> Result<Vec<u8>, EncodeError> {
        match &self.filter {
            Some(filter) => Ok(filter.filter(bytes)?),
            None => Ok(bytes),
        }
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("encoder", &self.encoder.as_ref().map(|e| e.name()))
            .field("filter", &self.filter.as_ref().map(|f| f.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use ferry_encode::{FilterError, PlainEncoder};
    use ferry_metrics::SenderMetrics;

    struct Upper;
    impl Filter for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn filter(&self, input: Vec<u8>) -> Result<Vec<u8>, FilterError> {
            Ok(input.to_ascii_uppercase())
        }
    }

    struct Broken;
    impl Filter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn filter(&self, _input: Vec<u8>) -> Result<Vec<u8>, FilterError> {
            Err(FilterError::process("broken", "no"))
        }
    }

    fn plain() -> Arc<dyn Encoder> {
        Arc::new(PlainEncoder::default())
    }

    #[test]
    fn test_encode_event_through_filter() {
        let codec = Codec::new(Some(plain()), Some(Arc::new(Upper)));
        let out = codec.encode_event(&Event::new("hello")).unwrap();
        assert_eq!(out, b"HELLO\n");
    }

    #[test]
    fn test_encode_without_encoder_fails() {
        let codec = Codec::default();
        let err = codec.encode_event(&Event::new("x")).unwrap_err();
        assert!(matches!(err, EncodeError::Config(_)));
    }

    #[test]
    fn test_filter_error_becomes_encode_error() {
        let codec = Codec::new(Some(plain()), Some(Arc::new(Broken)));
        let err = codec.encode_event(&Event::new("x")).unwrap_err();
        assert!(matches!(err, EncodeError::Filter(_)));
    }

    #[test]
    fn test_encode_batch_skips_settled_futures() {
        let metrics = Arc::new(SenderMetrics::new());
        let mut batch = Batch::new(4, Arc::clone(&metrics));
        let skipped = batch.append(Event::new("skipped"));
        batch.append(Event::new("kept"));
        skipped.complete(false);

        let codec = Codec::new(Some(plain()), None);
        let out = codec.encode_batch(&batch).unwrap();
        assert_eq!(out, b"kept\n");

        batch.complete_pending(true);
        batch.finalize();
    }
}
