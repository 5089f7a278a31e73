//! TCP sink - batch delivery over a length-prefixed stream
//!
//! Encodes each batch through the sender's codec and ships it as one frame:
//!
//! ```text
//! [4 bytes: length (big-endian)][N bytes: encoded batch]
//! ```
//!
//! The connection is established lazily, kept across flushes, and dropped
//! on any write error so the next flush reconnects.

use std::io::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ferry_sender::{Batch, Capabilities, Codec, SenderError, Sink};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Configuration for the TCP sink.
#[derive(Debug, Clone)]
pub struct TcpSinkConfig {
    /// Target address (host:port).
    pub target: String,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Write timeout per frame.
    pub write_timeout: Duration,
}

impl TcpSinkConfig {
    /// Create a config for the given target.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connection_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// Errors from the TCP sink.
#[derive(Debug, thiserror::Error)]
pub enum TcpSinkError {
    /// Connection failed.
    #[error("connection failed to {target}: {source}")]
    ConnectionFailed {
        /// The configured target.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Write failed.
    #[error("write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,
}

impl From<TcpSinkError> for SenderError {
    fn from(error: TcpSinkError) -> Self {
        SenderError::send(error.to_string())
    }
}

/// Batch-only sink writing length-prefixed frames over TCP.
pub struct TcpSink {
    config: TcpSinkConfig,

    /// Open connection, if any; a mutex because reconnects race flushes
    /// only at shutdown.
    connection: Mutex<Option<TcpStream>>,

    /// Frames delivered.
    frames_sent: AtomicU64,

    /// Bytes delivered, including prefixes.
    bytes_sent: AtomicU64,
}

impl TcpSink {
    /// Create a TCP sink; the connection is established on first flush.
    pub fn new(config: TcpSinkConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Frames delivered so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Bytes delivered so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Connect to the target, replacing any existing connection.
    async fn connect(&self) -> Result<(), TcpSinkError> {
        let mut conn = self.connection.lock().await;
        conn.take();

        let stream = match timeout(
            self.config.connection_timeout,
            TcpStream::connect(&self.config.target),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TcpSinkError::ConnectionFailed {
                    target: self.config.target.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(TcpSinkError::ConnectionFailed {
                    target: self.config.target.clone(),
                    source: std::io::Error::new(ErrorKind::TimedOut, "connection timed out"),
                });
            }
        };

        // Lower latency for small frames; non-fatal if it fails.
        if let Err(error) = stream.set_nodelay(true) {
            tracing::debug!(target = %self.config.target, error = %error, "failed to set TCP_NODELAY");
        }

        tracing::debug!(target = %self.config.target, "connected");
        *conn = Some(stream);
        Ok(())
    }

    /// Write one length-prefixed frame.
    async fn send_frame(&self, frame: &[u8]) -> Result<(), TcpSinkError> {
        {
            let conn = self.connection.lock().await;
            if conn.is_none() {
                drop(conn);
                self.connect().await?;
            }
        }

        let mut conn = self.connection.lock().await;
        let stream = match conn.as_mut() {
            Some(stream) => stream,
            None => {
                return Err(TcpSinkError::ConnectionFailed {
                    target: self.config.target.clone(),
                    source: std::io::Error::new(ErrorKind::NotConnected, "no connection"),
                });
            }
        };

        let prefix = (frame.len() as u32).to_be_bytes();
        let write = timeout(self.config.write_timeout, async {
            stream.write_all(&prefix).await?;
            stream.write_all(frame).await?;
            stream.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await;

        match write {
            Ok(Ok(())) => {
                self.frames_sent.fetch_add(1, Ordering::Relaxed);
                self.bytes_sent
                    .fetch_add(frame.len() as u64 + 4, Ordering::Relaxed);
                Ok(())
            }
            Ok(Err(error)) => {
                // Drop the connection; the next flush reconnects.
                conn.take();
                Err(TcpSinkError::WriteFailed(error))
            }
            Err(_) => {
                conn.take();
                Err(TcpSinkError::Timeout)
            }
        }
    }
}

#[async_trait]
impl Sink for TcpSink {
    fn name(&self) -> &str {
        "tcp"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::batch_only()
    }

    async fn flush(&self, batch: &Batch, codec: &Codec) -> Result<(), SenderError> {
        let frame = codec.encode_batch(batch)?;
        self.send_frame(&frame).await?;
        Ok(())
    }

    async fn stop(&self) {
        let mut conn = self.connection.lock().await;
        if conn.take().is_some() {
            tracing::debug!(target = %self.config.target, "connection closed");
        }
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
