//! EventFuture - one-shot completion handle for a single event

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::event::Event;

const PENDING: u8 = 0;
const DELIVERED: u8 = 1;
const FAILED: u8 = 2;

/// Delivery state of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Outcome not yet known.
    Pending,
    /// The sink delivered the event.
    Delivered,
    /// The event terminally failed.
    Failed,
}

/// Terminal outcome of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Whether the sink delivered the event.
    pub success: bool,
    /// Failure reason supplied by the sink, if any.
    pub message: Option<String>,
}

type SettleHook = Box<dyn FnOnce(&Delivery) + Send + 'static>;

/// One-shot completion handle carrying an event.
///
/// Cheap to clone; all clones observe the same state. The transition
/// `pending → delivered | failed` happens at most once - the first
/// completion wins, later calls are no-ops. This makes late completions
/// (a worker finishing a flush after shutdown already marked the batch
/// failed) harmless.
#[derive(Clone)]
pub struct EventFuture {
    inner: Arc<Inner>,
}

struct Inner {
    event: Event,
    state: AtomicU8,
    /// Failure message; written only by the winning `fail` call, under the
    /// lock held across the state transition.
    message: Mutex<Option<String>>,
    /// Callback run once, by whichever side wins the transition.
    settle: Mutex<Option<SettleHook>>,
    notify: Notify,
}

impl EventFuture {
    pub(crate) fn new(event: Event) -> Self {
        Self {
            inner: Arc::new(Inner {
                event,
                state: AtomicU8::new(PENDING),
                message: Mutex::new(None),
                settle: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// The event this future tracks.
    #[inline]
    pub fn event(&self) -> &Event {
        &self.inner.event
    }

    /// Current delivery state.
    pub fn state(&self) -> DeliveryState {
        match self.inner.state.load(Ordering::Acquire) {
            PENDING => DeliveryState::Pending,
            DELIVERED => DeliveryState::Delivered,
            _ => DeliveryState::Failed,
        }
    }

    /// Whether the outcome is still unknown.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == PENDING
    }

    /// Complete the future.
    ///
    /// Returns `true` if this call performed the transition; `false` when
    /// the future was already settled.
    pub fn complete(&self, success: bool) -> bool {
        self.transition(success, None)
    }

    /// Complete the future as failed with a sink-provided reason.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.transition(false, Some(message.into()))
    }

    /// Failure message, if the future failed with one.
    pub fn message(&self) -> Option<String> {
        self.inner.message.lock().clone()
    }

    /// The outcome, or `None` while pending.
    pub fn delivery(&self) -> Option<Delivery> {
        match self.state() {
            DeliveryState::Pending => None,
            DeliveryState::Delivered => Some(Delivery {
                success: true,
                message: None,
            }),
            DeliveryState::Failed => Some(Delivery {
                success: false,
                message: self.message(),
            }),
        }
    }

    /// Wait until the future settles.
    ///
    /// For external callers; the engine itself never blocks on this.
    pub async fn wait(&self) -> Delivery {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(delivery) = self.delivery() {
                return delivery;
            }
            notified.await;
        }
    }

    /// Arm a callback that runs exactly once when the future settles.
    ///
    /// If the future has already settled, the callback runs inline.
    pub(crate) fn on_settled(&self, hook: impl FnOnce(&Delivery) + Send + 'static) {
        {
            let mut slot = self.inner.settle.lock();
            if self.inner.state.load(Ordering::Acquire) == PENDING {
                *slot = Some(Box::new(hook));
                return;
            }
        }
        // Already settled before the hook was armed.
        if let Some(delivery) = self.delivery() {
            hook(&delivery);
        }
    }

    fn transition(&self, success: bool, message: Option<String>) -> bool {
        let next = if success { DELIVERED } else { FAILED };
        // Hold the message lock across the CAS so nobody can observe a
        // failed state without its message.
        let mut slot = self.inner.message.lock();
        if self
            .inner
            .state
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        *slot = message;
        drop(slot);

        self.inner.notify.notify_waiters();

        let hook = self.inner.settle.lock().take();
        if let Some(hook) = hook {
            if let Some(delivery) = self.delivery() {
                hook(&delivery);
            }
        }
        true
    }
}

impl std::fmt::Debug for EventFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFuture")
            .field("state", &self.state())
            .field("payload_len", &self.inner.event.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "future_test.rs"]
mod future_test;
