//! Batch - a sealed group of event futures flushed together
//!
//! A batch is mutable only while it sits in the [`BatchCell`]; once swapped
//! out it is sealed and owned by exactly one consumer (a worker, or the
//! shutdown path). `finalize` consumes the batch, so per-future status
//! reporting runs exactly once by construction.

use std::sync::Arc;

use ferry_metrics::SenderMetrics;
use parking_lot::Mutex;

use crate::event::Event;
use crate::future::{DeliveryState, EventFuture};

/// An append-only collection of event futures bound to one sender.
pub struct Batch {
    futures: Vec<EventFuture>,
    metrics: Arc<SenderMetrics>,
    finalized: bool,
}

impl Batch {
    /// Create an empty batch. Moves the `active_batches` gauge up; the
    /// matching decrement happens when the batch is dropped.
    pub(crate) fn new(capacity: usize, metrics: Arc<SenderMetrics>) -> Self {
        metrics.batch_opened();
        Self {
            futures: Vec::with_capacity(capacity),
            metrics,
            finalized: false,
        }
    }

    /// Append an event, returning its future.
    ///
    /// Only called through the cell, while this batch is current.
    pub(crate) fn append(&mut self, event: Event) -> EventFuture {
        let future = EventFuture::new(event);
        self.futures.push(future.clone());
        future
    }

    /// Number of futures in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.futures.len()
    }

    /// Whether the batch holds no futures.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }

    /// Iterate over the futures that are still pending.
    ///
    /// This is the view sinks flush and workers complete; futures already
    /// settled (for instance by shutdown) are skipped, which prevents
    /// double completion.
    pub fn pending(&self) -> impl Iterator<Item = &EventFuture> + '_ {
        self.futures.iter().filter(|future| future.is_pending())
    }

    /// Complete every still-pending future, in append order.
    pub(crate) fn complete_pending(&self, success: bool) {
        for future in self.pending() {
            future.complete(success);
        }
    }

    /// Report the outcome of every future and invoke each event's `end()`.
    ///
    /// Consuming `self` makes the exactly-once contract structural: a
    /// sealed batch can only be finalized by the single owner holding it.
    pub(crate) fn finalize(mut self) {
        self.finalized = true;
        for future in &self.futures {
            settle(&self.metrics, future);
        }
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if !self.finalized && !self.futures.is_empty() {
            tracing::warn!(events = self.futures.len(), "batch dropped without finalize");
        }
        self.metrics.batch_closed();
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("len", &self.futures.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}

/// Record one settled future in the statistics and end its event.
///
/// Shared by batch finalization and the asynchronous dispatch path, so the
/// accounting rules live in one place: delivered counts as `sent`, a
/// failure with a sink message counts under that message, a bare failure
/// counts as `failed_send`.
pub(crate) fn settle(metrics: &SenderMetrics, future: &EventFuture) {
    match future.state() {
        DeliveryState::Delivered => metrics.record_sent(),
        DeliveryState::Failed => match future.message() {
            Some(message) => metrics.record_sender_error(&message),
            None => metrics.record_failed(),
        },
        DeliveryState::Pending => {
            // Settling runs only after completion; a pending future here is
            // a missed completion. Fail it rather than losing the event.
            future.complete(false);
            metrics.record_failed();
        }
    }
    future.event().end();
}

/// The single slot holding the batch that is currently accepting events.
///
/// The mutex makes the swap atomic: an append racing a swap lands in either
/// the pre-swap or the post-swap batch, never anywhere else. `take` empties
/// the cell for good - used once, at shutdown.
pub(crate) struct BatchCell {
    slot: Mutex<Option<Batch>>,
}

impl BatchCell {
    pub(crate) fn new(initial: Batch) -> Self {
        Self {
            slot: Mutex::new(Some(initial)),
        }
    }

    /// Append to the current batch, returning the future and the batch size
    /// after the append. Gives the event back when the cell was emptied by
    /// shutdown.
    pub(crate) fn append(&self, event: Event) -> Result<(EventFuture, usize), Event> {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(batch) => {
                let future = batch.append(event);
                Ok((future, batch.len()))
            }
            None => Err(event),
        }
    }

    /// Swap in a fresh batch, returning the sealed one.
    ///
    /// A drained cell stays empty: the fresh batch is discarded and `None`
    /// returned, so nothing can be queued behind a shutdown.
    pub(crate) fn swap(&self, fresh: Batch) -> Option<Batch> {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            return None;
        }
        slot.replace(fresh)
    }

    /// Empty the cell, returning the current batch if any.
    pub(crate) fn take(&self) -> Option<Batch> {
        self.slot.lock().take()
    }

    /// Size of the current batch (0 when drained).
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slot.lock().as_ref().map_or(0, Batch::len)
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
