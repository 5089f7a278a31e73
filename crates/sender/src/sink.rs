//! Sink - the pluggable outbound delivery primitive
//!
//! A sink implements the capability matching its declaration: synchronous
//! single-event delivery, asynchronous accept-and-complete-later, or batch
//! flush. The default methods reject what the sink did not opt into, so a
//! misconfigured mode surfaces as [`SenderError::Unsupported`] instead of
//! silently dropping events.

use async_trait::async_trait;

use crate::batch::Batch;
use crate::codec::Codec;
use crate::error::SenderError;
use crate::event::Event;
use crate::future::EventFuture;

/// What a sink declares it can do.
///
/// Drives mode selection at construction; see [`crate::DeliveryMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The sink can flush whole batches.
    pub batching: bool,

    /// The sink *only* works batched; batch size and workers are clamped
    /// to at least one even if the configuration disabled batching.
    pub batch_only: bool,

    /// The sink accepts events and completes their futures later.
    pub asynchronous: bool,

    /// The sink encodes for itself; no encoder needs to be configured.
    pub self_encoding: bool,
}

impl Capabilities {
    /// Plain synchronous delivery.
    pub const fn synchronous() -> Self {
        Self {
            batching: false,
            batch_only: false,
            asynchronous: false,
            self_encoding: false,
        }
    }

    /// Batch-capable: batched when a batch size is configured, otherwise
    /// synchronous.
    pub const fn batching() -> Self {
        Self {
            batching: true,
            batch_only: false,
            asynchronous: false,
            self_encoding: false,
        }
    }

    /// Batch-only: always batched, configuration is clamped as needed.
    pub const fn batch_only() -> Self {
        Self {
            batching: true,
            batch_only: true,
            asynchronous: false,
            self_encoding: false,
        }
    }

    /// Asynchronous: the sink completes futures itself.
    pub const fn asynchronous() -> Self {
        Self {
            batching: false,
            batch_only: false,
            asynchronous: true,
            self_encoding: false,
        }
    }

    /// Mark the sink as self-encoding.
    #[must_use]
    pub const fn with_self_encoding(mut self) -> Self {
        self.self_encoding = true;
        self
    }
}

/// The outbound delivery primitive a sender drives.
///
/// Implement the method matching the declared capability; the engine never
/// calls the others. Every method receives the sender's [`Codec`] so the
/// sink encodes at the granularity its wire format needs.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Sink name, used in logs and metrics.
    fn name(&self) -> &str;

    /// Capability declaration; the default is plain synchronous.
    fn capabilities(&self) -> Capabilities {
        Capabilities::synchronous()
    }

    /// Deliver one event synchronously. `Ok(true)` means delivered.
    async fn send(&self, event: &Event, codec: &Codec) -> Result<bool, SenderError> {
        let _ = (event, codec);
        Err(SenderError::Unsupported("synchronous send"))
    }

    /// Accept one event for deferred completion.
    ///
    /// `Ok(true)` means the sink took ownership of the outcome and will
    /// complete `future` itself; `Ok(false)` means the event was not
    /// accepted and the engine fails it immediately.
    async fn send_async(&self, future: EventFuture, codec: &Codec) -> Result<bool, SenderError> {
        let _ = (future, codec);
        Err(SenderError::Unsupported("asynchronous send"))
    }

    /// Deliver every pending event of the batch.
    ///
    /// A normal return completes all pending futures as delivered; an error
    /// completes them as failed. The sink may also settle individual
    /// futures itself (per-event bulk errors) - the engine only completes
    /// futures that are still pending afterwards.
    async fn flush(&self, batch: &Batch, codec: &Codec) -> Result<(), SenderError> {
        let _ = (batch, codec);
        Err(SenderError::Unsupported("batch flush"))
    }

    /// Teardown hook invoked during shutdown, after the workers stopped.
    async fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_constructors() {
        assert_eq!(Capabilities::synchronous(), Capabilities::default());

        let batching = Capabilities::batching();
        assert!(batching.batching);
        assert!(!batching.batch_only);

        let batch_only = Capabilities::batch_only();
        assert!(batch_only.batching);
        assert!(batch_only.batch_only);

        let asynchronous = Capabilities::asynchronous();
        assert!(asynchronous.asynchronous);
        assert!(!asynchronous.batching);

        assert!(Capabilities::batching().with_self_encoding().self_encoding);
    }

    #[tokio::test]
    async fn test_default_methods_reject() {
        struct Bare;
        impl Sink for Bare {
            fn name(&self) -> &str {
                "bare"
            }
        }

        let codec = Codec::default();
        let result = Bare.send(&Event::new("x"), &codec).await;
        assert!(matches!(result, Err(SenderError::Unsupported(_))));
    }
}
