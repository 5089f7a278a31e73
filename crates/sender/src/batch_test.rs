use super::*;
use crate::event::Event;
use crate::future::DeliveryState;
use ferry_metrics::SenderMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn metrics() -> Arc<SenderMetrics> {
    Arc::new(SenderMetrics::new())
}

fn counting_event(calls: &Arc<AtomicUsize>) -> Event {
    let counter = Arc::clone(calls);
    Event::with_end_hook("payload", Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }))
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn test_append_returns_future_for_event() {
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));

    let future = batch.append(Event::new("a"));
    assert!(future.is_pending());
    assert_eq!(batch.len(), 1);
    assert!(!batch.is_empty());
}

#[test]
fn test_active_batches_gauge_follows_lifetime() {
    let m = metrics();
    assert_eq!(m.active_batches(), 0);

    let batch = Batch::new(4, Arc::clone(&m));
    assert_eq!(m.active_batches(), 1);

    drop(batch);
    assert_eq!(m.active_batches(), 0);
}

#[test]
fn test_pending_skips_settled_futures() {
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));
    let first = batch.append(Event::new("a"));
    batch.append(Event::new("b"));
    batch.append(Event::new("c"));

    first.complete(false);

    assert_eq!(batch.pending().count(), 2);
    assert_eq!(batch.len(), 3);
}

#[test]
fn test_complete_pending_preserves_settled_outcomes() {
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));
    let failed = batch.append(Event::new("a"));
    let open = batch.append(Event::new("b"));

    failed.fail("early");
    batch.complete_pending(true);

    assert_eq!(failed.state(), DeliveryState::Failed);
    assert_eq!(open.state(), DeliveryState::Delivered);
}

#[test]
fn test_finalize_reports_and_ends_every_event() {
    let calls = Arc::new(AtomicUsize::new(0));
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));
    for _ in 0..3 {
        batch.append(counting_event(&calls));
    }

    batch.complete_pending(true);
    batch.finalize();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(m.sent(), 3);
    assert_eq!(m.active_batches(), 0);
}

#[test]
fn test_finalize_accounting_by_outcome() {
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));
    let delivered = batch.append(Event::new("a"));
    let labeled = batch.append(Event::new("b"));
    let bare = batch.append(Event::new("c"));

    delivered.complete(true);
    labeled.fail("bulk rejected");
    bare.complete(false);
    batch.finalize();

    assert_eq!(m.sent(), 1);
    assert_eq!(m.failed_send(), 1);
    assert_eq!(m.sender_errors_for("bulk rejected"), 1);
}

#[test]
fn test_finalize_settles_a_missed_completion() {
    let calls = Arc::new(AtomicUsize::new(0));
    let m = metrics();
    let mut batch = Batch::new(4, Arc::clone(&m));
    let forgotten = batch.append(counting_event(&calls));

    batch.finalize();

    assert_eq!(forgotten.state(), DeliveryState::Failed);
    assert_eq!(m.failed_send(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_batch_finalize() {
    let m = metrics();
    let batch = Batch::new(4, Arc::clone(&m));
    batch.finalize();

    assert_eq!(m.sent(), 0);
    assert_eq!(m.failed_send(), 0);
    assert_eq!(m.active_batches(), 0);
}

// =============================================================================
// BatchCell
// =============================================================================

#[test]
fn test_cell_append_grows_current_batch() {
    let m = metrics();
    let cell = BatchCell::new(Batch::new(4, Arc::clone(&m)));

    let (_f1, len1) = cell.append(Event::new("a")).unwrap();
    let (_f2, len2) = cell.append(Event::new("b")).unwrap();

    assert_eq!(len1, 1);
    assert_eq!(len2, 2);
    assert_eq!(cell.len(), 2);
}

#[test]
fn test_cell_swap_returns_sealed_batch() {
    let m = metrics();
    let cell = BatchCell::new(Batch::new(4, Arc::clone(&m)));
    cell.append(Event::new("a")).unwrap();

    let sealed = cell.swap(Batch::new(4, Arc::clone(&m))).unwrap();
    assert_eq!(sealed.len(), 1);
    assert_eq!(cell.len(), 0);

    sealed.complete_pending(false);
    sealed.finalize();
}

#[test]
fn test_cell_take_empties_for_good() {
    let m = metrics();
    let cell = BatchCell::new(Batch::new(4, Arc::clone(&m)));
    cell.append(Event::new("a")).unwrap();

    let taken = cell.take().unwrap();
    taken.complete_pending(false);
    taken.finalize();

    // Appends after the drain hand the event back.
    let event = cell.append(Event::new("b")).unwrap_err();
    assert_eq!(event.payload().as_ref(), b"b");

    // A swap after the drain is refused and the fresh batch discarded.
    assert!(cell.swap(Batch::new(4, Arc::clone(&m))).is_none());
    assert_eq!(m.active_batches(), 0);
}
