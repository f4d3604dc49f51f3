//! Node resource error types.

use thiserror::Error;

use crate::bootstrap::BootstrapFailure;
use tiller_transport::TransportError;

/// Result type alias for node resource operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors that can occur during node resource operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// No record with the given name exists on the server.
    #[error("node not found: {0}")]
    NotFound(String),

    /// `put_secret` was called without a configured secret.
    #[error("no encrypted data bag secret configured")]
    MissingSecret,

    /// Transport selection or a single-host command failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// One or more hosts failed during bootstrap; every host's outcome,
    /// successes included, is retained inside.
    #[error("{0}")]
    Bootstrap(BootstrapFailure),

    /// The overall bootstrap deadline elapsed before every host finished.
    #[error("bootstrap deadline of {secs}s exceeded")]
    Deadline { secs: u64 },

    /// The remote state client failed.
    #[error("state client error: {0}")]
    Store(String),
}
