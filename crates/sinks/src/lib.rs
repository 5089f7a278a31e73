//! Ferry - Sinks
//!
//! Reference sinks for the sender engine, one per delivery shape:
//!
//! - [`NullSink`] - synchronous, discards everything; for benchmarking and
//!   tests
//! - [`StdoutSink`] - synchronous debug output; not intended for
//!   production throughput
//! - [`TcpSink`] - batch-only network delivery with length-prefixed
//!   frames, timeouts and reconnect
//!
//! Anything production-grade (HTTP bulk endpoints, brokers) follows the
//! same pattern: implement [`ferry_sender::Sink`], declare capabilities,
//! encode through the codec the engine hands in.

mod null;
mod stdout;
mod tcp;

pub use null::NullSink;
pub use stdout::StdoutSink;
pub use tcp::{TcpSink, TcpSinkConfig, TcpSinkError};
