//! Management endpoint hook
//!
//! Monitoring registries differ per deployment, so registration is an
//! injectable hook. Both calls are best effort: a failure is logged, never
//! propagated, and never blocks startup or shutdown.

use thiserror::Error;

/// Error raised by a management registry.
#[derive(Debug, Error)]
#[error("management endpoint error: {0}")]
pub struct ManagementError(String);

impl ManagementError {
    /// Create an error from any displayable reason.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Registry for per-sender management endpoints.
pub trait ManagementHook: Send + Sync {
    /// Called once when the sender starts.
    fn register(&self, sender: &str) -> Result<(), ManagementError>;

    /// Called once during shutdown, before the sink's own teardown.
    fn unregister(&self, sender: &str) -> Result<(), ManagementError>;
}
