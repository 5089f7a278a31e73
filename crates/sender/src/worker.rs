//! Publisher workers and the flush scheduler
//!
//! Workers drain the batch queue and drive the sink's batch flush; the
//! scheduler seals the current batch when it grows older than the flush
//! interval. Both stop deterministically: workers on their shutdown marker
//! (cancellation as fallback), the scheduler on cancellation.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossfire::{MAsyncRx, TrySendError};
use tokio::time::{Instant, MissedTickBehavior};

use crate::batch::Batch;
use crate::sender::{BatchJob, Shared, SCHEDULER_TICK};

/// One publisher worker: take a batch, flush it, settle its futures.
pub(crate) async fn publisher(shared: Arc<Shared>, rx: MAsyncRx<BatchJob>, id: usize) {
    tracing::debug!(sender = %shared.name, worker = id, "publisher started");
    loop {
        let job = tokio::select! {
            _ = shared.worker_cancel.cancelled() => break,
            job = rx.recv() => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };
        match job {
            BatchJob::Shutdown => break,
            BatchJob::Flush(batch) => {
                if let Some(batching) = shared.batching() {
                    batching.depth.fetch_sub(1, Ordering::AcqRel);
                }
                flush_batch(&shared, batch).await;
            }
        }
    }
    tracing::debug!(sender = %shared.name, worker = id, "publisher stopped");
}

/// Flush one sealed batch and settle every future in it.
///
/// The order is mandatory: complete the still-pending futures first, then
/// finalize - finalization reads the final states for status reporting.
async fn flush_batch(shared: &Shared, batch: Batch) {
    shared.metrics.record_batch_size(batch.len());
    if batch.is_empty() {
        batch.finalize();
        return;
    }

    shared.touch_last_flush();
    let started = Instant::now();
    // Cancellation fails the batch instead of abandoning it, so every
    // future still settles and every event still ends.
    let result = tokio::select! {
        _ = shared.worker_cancel.cancelled() => Err(crate::error::SenderError::Closed),
        result = shared.sink.flush(&batch, &shared.codec) => result,
    };
    shared.metrics.record_flush_duration(started.elapsed());

    match result {
        Ok(()) => batch.complete_pending(true),
        Err(error) => {
            shared.handle_error(&error);
            batch.complete_pending(false);
        }
    }
    batch.finalize();
}

/// Periodic task sealing the current batch once it outlives the flush
/// interval.
///
/// The tick cadence is fixed; the configured interval only decides whether
/// a tick seals. Sealing takes the stop gate, which serializes it against
/// the feeder's size-triggered seal and against shutdown - so after
/// `closed` is set, no batch can enter the queue anymore.
pub(crate) async fn scheduler(shared: Arc<Shared>) {
    let Some(batching) = shared.batching() else {
        return;
    };

    let mut ticker = tokio::time::interval(SCHEDULER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::debug!(sender = %shared.name, "flush scheduler started");

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let gate = shared.stop_gate.lock().await;
        if shared.is_closed() {
            break;
        }

        let age_ms = shared
            .now_ms()
            .saturating_sub(shared.last_flush_ms.load(Ordering::Relaxed));
        if age_ms <= batching.flush_interval.as_millis() as u64 {
            continue;
        }

        // Best effort: while the queue is full the seal is deferred, the
        // batch stays current and the next tick retries.
        if batching.depth.load(Ordering::Acquire) >= batching.capacity {
            tracing::warn!(sender = %shared.name, "flush queue full, delaying scheduled flush");
            continue;
        }

        let Some(sealed) = batching.cell.swap(shared.new_batch()) else {
            continue;
        };
        tracing::debug!(sender = %shared.name, len = sealed.len(), "sealing aged batch");

        batching.depth.fetch_add(1, Ordering::AcqRel);
        match batching.tx.try_send(BatchJob::Flush(sealed)) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                // Producers are serialized by the gate and consumers only
                // shrink the queue, so this branch means the channel itself
                // failed; fail the batch rather than losing it.
                batching.depth.fetch_sub(1, Ordering::AcqRel);
                if let BatchJob::Flush(batch) = job {
                    tracing::error!(
                        sender = %shared.name,
                        len = batch.len(),
                        "failed to queue scheduled batch"
                    );
                    batch.complete_pending(false);
                    batch.finalize();
                }
            }
        }
        drop(gate);
    }
    tracing::debug!(sender = %shared.name, "flush scheduler stopped");
}
