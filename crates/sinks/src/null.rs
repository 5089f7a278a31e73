//! Null sink - discards all data

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ferry_sender::{Capabilities, Codec, Event, SenderError, Sink};

/// Accepts every event and throws it away.
///
/// Useful for benchmarking the engine without sink cost, and as the
/// simplest possible synchronous sink.
#[derive(Debug, Default)]
pub struct NullSink {
    discarded: AtomicU64,
}

impl NullSink {
    /// Create a null sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events discarded so far.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Sink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn capabilities(&self) -> Capabilities {
        // Nothing is written anywhere, so no encoder is required.
        Capabilities::synchronous().with_self_encoding()
    }

    async fn send(&self, _event: &Event, _codec: &Codec) -> Result<bool, SenderError> {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discards_and_counts() {
        let sink = NullSink::new();
        let codec = Codec::default();
        assert!(sink.send(&Event::new("x"), &codec).await.unwrap());
        assert!(sink.send(&Event::new("y"), &codec).await.unwrap());
        assert_eq!(sink.discarded(), 2);
    }
}
