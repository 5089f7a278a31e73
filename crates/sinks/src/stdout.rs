//! Stdout sink - human-readable debug output
//!
//! Writes each encoded event to stdout. Not intended for production use at
//! high throughput.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ferry_sender::{Codec, Event, SenderError, Sink};
use tokio::io::AsyncWriteExt;

/// Debug sink printing encoded events to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink {
    written: AtomicU64,
}

impl StdoutSink {
    /// Create a stdout sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events written so far.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn send(&self, event: &Event, codec: &Codec) -> Result<bool, SenderError> {
        let encoded = codec.encode_event(event)?;
        let mut out = tokio::io::stdout();
        out.write_all(&encoded)
            .await
            .map_err(|e| SenderError::send(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SenderError::send(e.to_string()))?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_encode::PlainEncoder;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_writes_encoded_event() {
        let sink = StdoutSink::new();
        let codec = Codec::new(Some(Arc::new(PlainEncoder::default())), None);

        assert!(sink.send(&Event::new("debug line"), &codec).await.unwrap());
        assert_eq!(sink.written(), 1);
    }

    #[tokio::test]
    async fn test_encode_failure_surfaces() {
        let sink = StdoutSink::new();
        // No encoder configured: the codec refuses and the sink propagates.
        let codec = Codec::default();

        let result = sink.send(&Event::new("x"), &codec).await;
        assert!(matches!(result, Err(SenderError::Encode(_))));
    }
}
