//! Transport error types.

use thiserror::Error;

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while selecting a transport or executing a
/// remote command.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The requested transport has no configuration on the target.
    #[error("no {requested} transport configured for host {host}")]
    Unavailable { host: String, requested: String },

    /// The remote command ran but exited non-zero.
    #[error("command failed on {host} (exit {exit_status}): {stderr}")]
    CommandFailed {
        host: String,
        exit_status: i32,
        stdout: String,
        stderr: String,
    },

    /// The operation did not complete within its deadline.
    #[error("operation on {host} timed out after {secs}s")]
    Timeout { host: String, secs: u64 },

    /// Connection-level failure before a command could run.
    #[error("connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },
}

impl TransportError {
    /// The host this error pertains to.
    pub fn host(&self) -> &str {
        match self {
            TransportError::Unavailable { host, .. }
            | TransportError::CommandFailed { host, .. }
            | TransportError::Timeout { host, .. }
            | TransportError::Connection { host, .. } => host,
        }
    }
}
