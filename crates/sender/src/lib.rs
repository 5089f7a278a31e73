//! Ferry - Sender
//!
//! The concurrent dispatch engine between an upstream event queue and a
//! pluggable sink.
//!
//! # Architecture
//!
//! ```text
//! [upstream queue] ──→ feeder ──┬─ synchronous ──→ Sink::send
//!                               ├─ asynchronous ─→ Sink::send_async
//!                               └─ batched ──→ current batch ──→ batch queue
//!                                                   ↑ age seal        │
//!                                               scheduler       worker pool
//!                                                                     │
//!                                                            Sink::flush(batch)
//!                                                                     │
//!                                                       future completion + end()
//! ```
//!
//! # Key Design
//!
//! - **One feeder task** pulls events and dispatches by the mode fixed at
//!   construction; a single-permit stop gate serializes each dispatch step
//!   against shutdown, so no event is accepted once closing has begun
//! - **Bounded batch queue** (8 × workers) between feeder and worker pool;
//!   a full queue blocks the feeder - that is the backpressure surface
//! - **One-shot futures**: every accepted event gets an [`EventFuture`]
//!   whose `pending → delivered | failed` transition happens at most once;
//!   completion is idempotent, so late sink callbacks after shutdown are
//!   harmless
//! - **Deterministic shutdown**: [`Sender::close`] drains the queue, marks
//!   in-flight events as failed, joins the workers within a bounded budget
//!   and interrupts stragglers; every event observed by the engine has its
//!   `end()` hook invoked exactly once
//!
//! # Example
//!
//! ```ignore
//! use ferry_sender::{Event, Sender, SenderConfig};
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(1024);
//! let sender = Sender::builder("bulk", sink)
//!     .config(SenderConfig::default().with_batch_size(500))
//!     .encoder(Arc::new(JsonEncoder::default()))
//!     .start(rx)?;
//!
//! tx.send(Event::new("payload")).await?;
//! sender.close().await;
//! ```

mod batch;
mod codec;
mod error;
mod event;
mod future;
mod management;
mod mode;
mod sender;
mod sink;
mod worker;

pub use batch::Batch;
pub use codec::Codec;
pub use error::{Result, SenderError, StartError};
pub use event::{EndHook, Event};
pub use future::{Delivery, DeliveryState, EventFuture};
pub use management::{ManagementError, ManagementHook};
pub use mode::DeliveryMode;
pub use sender::{Sender, SenderBuilder, SenderMetricsHandle};
pub use sink::{Capabilities, Sink};

// Re-export key types from dependencies for convenience
pub use ferry_config::SenderConfig;
pub use ferry_metrics::{SenderMetrics, SenderMetricsSnapshot};
