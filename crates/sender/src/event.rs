//! Event - the opaque unit of log data flowing through a sender

use bytes::Bytes;
use parking_lot::Mutex;

/// Callback invoked exactly once when an event's outcome is known.
pub type EndHook = Box<dyn FnOnce() + Send + 'static>;

/// One unit of log data.
///
/// The engine treats the payload as opaque bytes; interpretation belongs to
/// the encoder and the sink. The optional end hook is the upstream's
/// terminal callback - the engine invokes it exactly once, after the
/// event's delivery outcome has been recorded.
pub struct Event {
    payload: Bytes,
    end_hook: Mutex<Option<EndHook>>,
}

impl Event {
    /// Create an event from a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            end_hook: Mutex::new(None),
        }
    }

    /// Create an event with a terminal callback.
    pub fn with_end_hook(payload: impl Into<Bytes>, hook: EndHook) -> Self {
        Self {
            payload: payload.into(),
            end_hook: Mutex::new(Some(hook)),
        }
    }

    /// The event payload.
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Invoke the terminal callback.
    ///
    /// Idempotent: the hook is taken out of its slot, so only the first
    /// call runs it.
    pub(crate) fn end(&self) {
        let hook = self.end_hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_payload_access() {
        let event = Event::new("hello");
        assert_eq!(event.payload().as_ref(), b"hello");
        assert_eq!(event.len(), 5);
        assert!(!event.is_empty());
    }

    #[test]
    fn test_end_hook_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let event = Event::with_end_hook("x", Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        event.end();
        event.end();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_end_without_hook_is_noop() {
        let event = Event::new("x");
        event.end();
    }
}
