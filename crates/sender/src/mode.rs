//! Delivery mode selection

use crate::sink::Capabilities;

/// How a sender reports outcomes, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// One event at a time; the outcome is known when `send` returns and
    /// reported on the feeder path.
    Synchronous,

    /// The sink accepts events and completes their futures later; the
    /// outcome is reported at future completion (or immediately, on
    /// rejection).
    Asynchronous,

    /// Events are aggregated into batches flushed by the worker pool; the
    /// outcome is reported when the batch finalizes.
    Batched,
}

impl DeliveryMode {
    /// Resolve the mode from the sink declaration and the configured batch
    /// size.
    ///
    /// Batched wins when the sink is batch-capable and a batch size is set;
    /// a batch size on a non-batching sink is ignored.
    pub fn resolve(capabilities: Capabilities, batch_size: Option<usize>) -> Self {
        if capabilities.batching && matches!(batch_size, Some(n) if n > 0) {
            Self::Batched
        } else if capabilities.asynchronous {
            Self::Asynchronous
        } else {
            Self::Synchronous
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Synchronous => "synchronous",
            Self::Asynchronous => "asynchronous",
            Self::Batched => "batched",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batching_sink_with_batch_size() {
        let mode = DeliveryMode::resolve(Capabilities::batching(), Some(100));
        assert_eq!(mode, DeliveryMode::Batched);
    }

    #[test]
    fn test_batching_sink_without_batch_size_falls_back() {
        let mode = DeliveryMode::resolve(Capabilities::batching(), None);
        assert_eq!(mode, DeliveryMode::Synchronous);
    }

    #[test]
    fn test_batch_size_on_plain_sink_is_ignored() {
        let mode = DeliveryMode::resolve(Capabilities::synchronous(), Some(100));
        assert_eq!(mode, DeliveryMode::Synchronous);
    }

    #[test]
    fn test_async_sink() {
        let mode = DeliveryMode::resolve(Capabilities::asynchronous(), None);
        assert_eq!(mode, DeliveryMode::Asynchronous);
    }

    #[test]
    fn test_batching_beats_async() {
        let caps = Capabilities {
            batching: true,
            asynchronous: true,
            ..Capabilities::default()
        };
        assert_eq!(DeliveryMode::resolve(caps, Some(10)), DeliveryMode::Batched);
        assert_eq!(DeliveryMode::resolve(caps, None), DeliveryMode::Asynchronous);
    }

    #[test]
    fn test_display() {
        assert_eq!(DeliveryMode::Batched.to_string(), "batched");
    }
}
