//! Sender - construction, the feeder loop and the lifecycle controller

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossfire::{MAsyncRx, MAsyncTx};
use ferry_config::SenderConfig;
use ferry_encode::{Encoder, Filter};
use ferry_metrics::{SenderMetrics, SenderMetricsProvider, SenderMetricsSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::batch::{settle, Batch, BatchCell};
use crate::codec::Codec;
use crate::error::{SenderError, StartError};
use crate::event::Event;
use crate::future::EventFuture;
use crate::management::ManagementHook;
use crate::mode::DeliveryMode;
use crate::sink::Sink;
use crate::worker;

/// Batch queue capacity per worker.
pub(crate) const QUEUE_CAPACITY_PER_WORKER: usize = 8;

/// Cadence of the flush scheduler.
pub(crate) const SCHEDULER_TICK: Duration = Duration::from_secs(5);

/// How long `close` waits for each publisher before interrupting it.
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// What travels over the batch queue.
pub(crate) enum BatchJob {
    /// A sealed batch to deliver.
    Flush(Batch),
    /// Shutdown marker; each worker consumes exactly one and stops.
    Shutdown,
}

/// Batched-mode state: the current-batch cell and the worker-pool queue.
pub(crate) struct Batching {
    pub(crate) cell: BatchCell,
    pub(crate) tx: MAsyncTx<BatchJob>,
    pub(crate) rx: MAsyncRx<BatchJob>,
    /// Sealed batches waiting in the queue; backs the backlog warning and
    /// the scheduler's full-queue check.
    pub(crate) depth: AtomicUsize,
    pub(crate) capacity: usize,
    pub(crate) batch_size: usize,
    pub(crate) workers: usize,
    pub(crate) flush_interval: Duration,
}

/// Delivery mode with its runtime state, fixed at construction.
pub(crate) enum Mode {
    Synchronous,
    Asynchronous,
    Batched(Batching),
}

/// State shared by the feeder, the workers, the scheduler and the handle.
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) sink: Arc<dyn Sink>,
    pub(crate) codec: Codec,
    pub(crate) mode: Mode,
    /// Monotonic shutdown flag.
    pub(crate) closed: AtomicBool,
    /// Single-permit barrier serializing one dispatch step (or one
    /// scheduled seal) against the whole shutdown sequence. Tokio's mutex
    /// queues waiters fairly.
    pub(crate) stop_gate: tokio::sync::Mutex<()>,
    pub(crate) metrics: Arc<SenderMetrics>,
    /// Base instant for `last_flush_ms`.
    pub(crate) epoch: Instant,
    pub(crate) last_flush_ms: AtomicU64,
    /// Interrupts the feeder and the scheduler.
    pub(crate) cancel: CancellationToken,
    /// Fallback interrupt for publishers that outlive the join budget.
    pub(crate) worker_cancel: CancellationToken,
}

impl Shared {
    pub(crate) fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub(crate) fn touch_last_flush(&self) {
        self.last_flush_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn batching(&self) -> Option<&Batching> {
        match &self.mode {
            Mode::Batched(batching) => Some(batching),
            _ => None,
        }
    }

    pub(crate) fn new_batch(&self) -> Batch {
        let capacity = self.batching().map_or(0, |b| b.batch_size);
        Batch::new(capacity, Arc::clone(&self.metrics))
    }

    /// Report an outcome decided on the feeder path and end the event.
    pub(crate) fn report_immediate(&self, event: Event, success: bool) {
        if success {
            self.metrics.record_sent();
        } else {
            self.metrics.record_failed();
        }
        event.end();
    }

    /// Route an error through the taxonomy: statistics plus logging.
    ///
    /// Errors never cross a task boundary; each loop calls this at its top
    /// and keeps going. Only fatal errors tear the sender down.
    pub(crate) fn handle_error(&self, error: &SenderError) {
        match error {
            SenderError::Send(message) => {
                self.metrics.record_sender_error(message);
                tracing::error!(sender = %self.name, error = %error, "sending failed");
            }
            SenderError::Encode(_) => {
                self.metrics.record_sender_error(&error.to_string());
                tracing::error!(sender = %self.name, error = %error, "encoding failed");
            }
            SenderError::Closed => {
                tracing::debug!(sender = %self.name, "delivery interrupted by shutdown");
            }
            SenderError::Fatal(_) => {
                self.metrics.record_unhandled();
                tracing::error!(sender = %self.name, error = %error, "fatal error, tearing sender down");
                self.worker_cancel.cancel();
                self.cancel.cancel();
            }
            SenderError::Unsupported(_) | SenderError::Unexpected(_) => {
                self.metrics.record_unhandled();
                tracing::error!(sender = %self.name, error = %error, "unexpected error");
            }
        }
    }

    /// Append the event to the current batch; seal and enqueue on the size
    /// threshold. Gives the event back when the sender already closed.
    pub(crate) async fn queue_event(
        &self,
        batching: &Batching,
        event: Event,
    ) -> Result<(), Event> {
        if self.is_closed() {
            return Err(event);
        }
        let (_future, len) = batching.cell.append(event)?;
        if len >= batching.batch_size {
            tracing::debug!(sender = %self.name, len, "batch full, sealing");
            if let Some(sealed) = batching.cell.swap(self.new_batch()) {
                self.push_batch(batching, sealed).await;
            }
        }
        Ok(())
    }

    /// Hand a sealed batch to the worker pool, waiting for queue capacity.
    ///
    /// This wait is the backpressure surface: a full queue blocks the
    /// feeder rather than dropping the batch.
    pub(crate) async fn push_batch(&self, batching: &Batching, batch: Batch) {
        batching.depth.fetch_add(1, Ordering::AcqRel);
        match batching.tx.send(BatchJob::Flush(batch)).await {
            Ok(()) => {
                let depth = batching.depth.load(Ordering::Acquire);
                if depth > batching.workers {
                    tracing::warn!(
                        sender = %self.name,
                        waiting = depth - batching.workers,
                        "flush batches queuing up, consider more workers"
                    );
                }
            }
            Err(error) => {
                batching.depth.fetch_sub(1, Ordering::AcqRel);
                if let BatchJob::Flush(batch) = error.0 {
                    batch.complete_pending(false);
                    batch.finalize();
                }
            }
        }
    }

    /// Asynchronous dispatch: hand the future to the sink, settle on
    /// completion wherever it comes from.
    pub(crate) async fn dispatch_async(&self, event: Event) {
        let future = EventFuture::new(event);
        let settled = future.clone();
        let metrics = Arc::clone(&self.metrics);
        future.on_settled(move |_delivery| settle(&metrics, &settled));

        match self.sink.send_async(future.clone(), &self.codec).await {
            Ok(true) => {
                // The sink owns the completion now.
            }
            Ok(false) => {
                // Not accepted; immediate failure.
                future.complete(false);
            }
            Err(error) => {
                self.handle_error(&error);
                future.complete(false);
            }
        }
    }

    /// Synchronous dispatch: outcome known when the sink returns.
    pub(crate) async fn dispatch_sync(&self, event: Event) {
        match self.sink.send(&event, &self.codec).await {
            Ok(status) => self.report_immediate(event, status),
            Err(error) => {
                self.handle_error(&error);
                self.report_immediate(event, false);
            }
        }
    }
}

/// The feeder loop: one task pulling events off the upstream queue and
/// dispatching them by mode.
async fn feeder(shared: Arc<Shared>, mut upstream: mpsc::Receiver<Event>) {
    tracing::debug!(sender = %shared.name, "feeder started");
    loop {
        if shared.is_closed() {
            break;
        }
        let event = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            event = upstream.recv() => match event {
                Some(event) => event,
                None => {
                    tracing::debug!(sender = %shared.name, "upstream queue closed");
                    break;
                }
            },
        };

        // One dispatch step under the gate; shutdown cannot begin while an
        // event is in flight here.
        let gate = shared.stop_gate.lock().await;
        if shared.is_closed() {
            shared.report_immediate(event, false);
            continue;
        }
        tracing::trace!(sender = %shared.name, "new event to send");
        match &shared.mode {
            Mode::Batched(batching) => {
                if let Err(event) = shared.queue_event(batching, event).await {
                    shared.report_immediate(event, false);
                }
            }
            Mode::Asynchronous => shared.dispatch_async(event).await,
            Mode::Synchronous => shared.dispatch_sync(event).await,
        }
        drop(gate);
    }
    tracing::debug!(sender = %shared.name, "feeder stopped");
}

/// Builder for a [`Sender`].
pub struct SenderBuilder {
    name: String,
    sink: Arc<dyn Sink>,
    config: SenderConfig,
    encoder: Option<Arc<dyn Encoder>>,
    filter: Option<Arc<dyn Filter>>,
    metrics: Option<Arc<SenderMetrics>>,
    management: Option<Arc<dyn ManagementHook>>,
}

impl SenderBuilder {
    /// Create a builder with the default configuration.
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.into(),
            sink,
            config: SenderConfig::default(),
            encoder: None,
            filter: None,
            metrics: None,
            management: None,
        }
    }

    /// Set the sender configuration.
    #[must_use]
    pub fn config(mut self, config: SenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the encoder.
    #[must_use]
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Set the payload filter.
    #[must_use]
    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Share a metrics instance instead of creating a fresh one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<SenderMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the management registry hook.
    #[must_use]
    pub fn management(mut self, hook: Arc<dyn ManagementHook>) -> Self {
        self.management = Some(hook);
        self
    }

    /// Verify the configuration and start the sender's tasks.
    ///
    /// Must run inside a tokio runtime. `upstream` is the event queue the
    /// feeder drains.
    pub fn start(self, upstream: mpsc::Receiver<Event>) -> Result<Sender, StartError> {
        let capabilities = self.sink.capabilities();
        let config = if capabilities.batch_only {
            self.config.clamped_for_batch_only()
        } else {
            self.config
        };
        config.validate(&self.name)?;

        let codec = Codec::new(self.encoder, self.filter);
        if !codec.has_encoder() && !capabilities.self_encoding {
            tracing::error!(sender = %self.name, "missing encoder");
            return Err(StartError::MissingEncoder(self.name));
        }
        codec.validate().map_err(|source| StartError::InvalidEncoder {
            sender: self.name.clone(),
            source,
        })?;

        let delivery_mode = DeliveryMode::resolve(capabilities, config.batch_size);
        let metrics = self.metrics.unwrap_or_default();

        let mode = match delivery_mode {
            DeliveryMode::Batched => {
                let batch_size = config.batch_size.unwrap_or(1);
                let workers = config.workers;
                let capacity = workers * QUEUE_CAPACITY_PER_WORKER;
                let (tx, rx) = crossfire::mpmc::bounded_async::<BatchJob>(capacity);
                Mode::Batched(Batching {
                    cell: BatchCell::new(Batch::new(batch_size, Arc::clone(&metrics))),
                    tx,
                    rx,
                    depth: AtomicUsize::new(0),
                    capacity,
                    batch_size,
                    workers,
                    flush_interval: config.flush_interval(),
                })
            }
            DeliveryMode::Asynchronous => Mode::Asynchronous,
            DeliveryMode::Synchronous => Mode::Synchronous,
        };

        let shared = Arc::new(Shared {
            name: self.name,
            sink: self.sink,
            codec,
            mode,
            closed: AtomicBool::new(false),
            stop_gate: tokio::sync::Mutex::new(()),
            metrics,
            epoch: Instant::now(),
            last_flush_ms: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            worker_cancel: CancellationToken::new(),
        });

        if let Some(hook) = &self.management {
            if let Err(error) = hook.register(&shared.name) {
                tracing::warn!(
                    sender = %shared.name,
                    error = %error,
                    "failed to register management endpoint"
                );
            }
        }

        let mut workers = Vec::new();
        let mut scheduler = None;
        if let Mode::Batched(batching) = &shared.mode {
            for id in 0..batching.workers {
                workers.push(tokio::spawn(worker::publisher(
                    Arc::clone(&shared),
                    batching.rx.clone(),
                    id,
                )));
            }
            scheduler = Some(tokio::spawn(worker::scheduler(Arc::clone(&shared))));
        }
        let feeder = tokio::spawn(feeder(Arc::clone(&shared), upstream));

        tracing::info!(
            sender = %shared.name,
            mode = %delivery_mode,
            workers = workers.len(),
            "sender started"
        );

        Ok(Sender {
            shared,
            delivery_mode,
            feeder: Some(feeder),
            scheduler,
            workers,
            management: self.management,
        })
    }
}

/// Handle to a running sender.
///
/// Dropping the handle without [`Sender::close`] aborts the tasks without
/// draining; always close for a graceful shutdown.
pub struct Sender {
    shared: Arc<Shared>,
    delivery_mode: DeliveryMode,
    feeder: Option<JoinHandle<()>>,
    scheduler: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    management: Option<Arc<dyn ManagementHook>>,
}

impl Sender {
    /// Create a builder.
    pub fn builder(name: impl Into<String>, sink: Arc<dyn Sink>) -> SenderBuilder {
        SenderBuilder::new(name, sink)
    }

    /// The sender name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The delivery mode fixed at construction.
    pub fn mode(&self) -> DeliveryMode {
        self.delivery_mode
    }

    /// Whether shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// The sender's metrics.
    pub fn metrics(&self) -> &SenderMetrics {
        &self.shared.metrics
    }

    /// Get a metrics handle for reporting.
    ///
    /// The handle implements [`SenderMetricsProvider`] and stays valid
    /// after the sender is closed.
    pub fn metrics_handle(&self) -> SenderMetricsHandle {
        SenderMetricsHandle {
            name: self.shared.name.clone(),
            metrics: Arc::clone(&self.shared.metrics),
        }
    }

    /// Shut down and block until every task has stopped.
    ///
    /// Once this returns: no future is pending, every worker has stopped,
    /// and every event observed by the engine has had `end()` invoked
    /// exactly once.
    pub async fn close(mut self) {
        self.stop().await;
    }

    async fn stop(&mut self) {
        // Hold the gate for the whole sequence: no event is mid-dispatch
        // and no scheduled seal runs once we own it.
        let gate = self.shared.stop_gate.lock().await;
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(sender = %self.shared.name, "sender closing");

        if let Mode::Batched(batching) = &self.shared.mode {
            // Pull waiting batches out and put one shutdown marker per
            // worker in their place.
            let mut missed = Vec::new();
            while let Ok(job) = batching.rx.try_recv() {
                if let BatchJob::Flush(batch) = job {
                    batching.depth.fetch_sub(1, Ordering::AcqRel);
                    missed.push(batch);
                }
            }
            for _ in 0..batching.workers {
                if let Err(error) = batching.tx.try_send(BatchJob::Shutdown) {
                    tracing::debug!(
                        sender = %self.shared.name,
                        error = %error,
                        "failed to queue shutdown marker"
                    );
                }
            }

            // Terminal failure for everything that never reached a worker.
            if let Some(current) = batching.cell.take() {
                current.complete_pending(false);
                current.finalize();
            }
            for batch in missed {
                batch.complete_pending(false);
                batch.finalize();
            }

            // Bounded join, then interrupt the stragglers.
            let mut stragglers = Vec::new();
            for mut handle in self.workers.drain(..) {
                match tokio::time::timeout(WORKER_JOIN_TIMEOUT, &mut handle).await {
                    Ok(_) => {}
                    Err(_) => stragglers.push(handle),
                }
            }
            if !stragglers.is_empty() {
                tracing::warn!(
                    sender = %self.shared.name,
                    stragglers = stragglers.len(),
                    "publishers did not stop in time, interrupting"
                );
                self.shared.worker_cancel.cancel();
                for mut handle in stragglers {
                    if tokio::time::timeout(WORKER_JOIN_TIMEOUT, &mut handle)
                        .await
                        .is_err()
                    {
                        handle.abort();
                        let _ = handle.await;
                    }
                }
            }

            // Defensive sweep: nothing should reach the queue after the
            // markers, but a leftover batch must still fail and finalize.
            while let Ok(job) = batching.rx.try_recv() {
                if let BatchJob::Flush(batch) = job {
                    batching.depth.fetch_sub(1, Ordering::AcqRel);
                    batch.complete_pending(false);
                    batch.finalize();
                }
            }
        }

        if let Some(hook) = &self.management {
            if let Err(error) = hook.unregister(&self.shared.name) {
                tracing::warn!(
                    sender = %self.shared.name,
                    error = %error,
                    "failed to unregister management endpoint"
                );
            }
        }

        self.shared.sink.stop().await;

        // Interrupt the feeder and the scheduler. The gate is released
        // first so a feeder blocked on it can observe the closed flag.
        self.shared.cancel.cancel();
        drop(gate);
        if let Some(handle) = self.feeder.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.scheduler.take() {
            let _ = handle.await;
        }

        tracing::info!(sender = %self.shared.name, "sender closed");
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        if !self.shared.is_closed() {
            tracing::warn!(
                sender = %self.shared.name,
                "sender dropped without close, aborting tasks"
            );
            self.shared.closed.store(true, Ordering::SeqCst);
            self.shared.worker_cancel.cancel();
            self.shared.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("name", &self.shared.name)
            .field("mode", &self.delivery_mode)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Handle for accessing sender metrics externally.
///
/// Implements [`SenderMetricsProvider`] for use with the metrics reporter.
#[derive(Clone)]
pub struct SenderMetricsHandle {
    name: String,
    metrics: Arc<SenderMetrics>,
}

impl SenderMetricsProvider for SenderMetricsHandle {
    fn sender_name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> SenderMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
#[path = "sender_test.rs"]
mod sender_test;
