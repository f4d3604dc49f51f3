//! Host command executor boundary.
//!
//! A `HostCommander` knows how to run the small fixed set of remote
//! operations over an already-resolved transport. Implementations own the
//! wire details (SSH sessions, WinRM shells); this crate only routes to
//! them. The implementation is chosen at construction time, so there is no
//! per-call transport sniffing.

use async_trait::async_trait;
use tiller_core::{CommandOutput, SshOptions, WinrmOptions};

use crate::error::TransportResult;

/// The transport options resolved for one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOptions {
    Ssh(SshOptions),
    Winrm(WinrmOptions),
}

impl TransportOptions {
    /// Human-readable transport name, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportOptions::Ssh(_) => "ssh",
            TransportOptions::Winrm(_) => "winrm",
        }
    }
}

/// Remote execution capability consumed by the dispatcher.
///
/// Every method targets a single host and returns the captured output,
/// or a transport error if the command could not be run at all. A
/// non-zero exit is reported inside `CommandOutput`, not as an `Err` —
/// callers decide how strict to be.
#[async_trait]
pub trait HostCommander: Send + Sync {
    /// Trigger a configuration-convergence run on the host.
    async fn chef_client(
        &self,
        host: &str,
        options: &TransportOptions,
    ) -> TransportResult<CommandOutput>;

    /// Write the encrypted-data-bag secret onto the host.
    async fn put_secret(
        &self,
        host: &str,
        secret: &str,
        options: &TransportOptions,
    ) -> TransportResult<CommandOutput>;

    /// Execute the given lines as a Ruby script on the host, in order.
    async fn ruby_script(
        &self,
        host: &str,
        command_lines: &[String],
        options: &TransportOptions,
    ) -> TransportResult<CommandOutput>;

    /// Execute an arbitrary command string on the host.
    async fn run(
        &self,
        host: &str,
        command: &str,
        options: &TransportOptions,
    ) -> TransportResult<CommandOutput>;
}
