//! Transport selection — binds a host to exactly one execution channel.
//!
//! A target may carry both SSH and WinRM configuration; each dispatch
//! resolves exactly one of them, either by explicit preference or by the
//! `Auto` rule (SSH first, then WinRM). Selection never falls back
//! silently: an explicit preference whose configuration is missing is an
//! error.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use tiller_core::{CommandOutput, TransportTarget};

use crate::commander::{HostCommander, TransportOptions};
use crate::error::{TransportError, TransportResult};

/// Which transport the caller wants for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preference {
    Ssh,
    Winrm,
    /// Prefer SSH when configured, otherwise WinRM.
    #[default]
    Auto,
}

/// Resolve the transport for `target` and bind it to a commander.
///
/// The returned [`BoundTransport`] carries everything one dispatch needs:
/// the host, the resolved options, the executor, and the per-operation
/// timeout.
pub fn select(
    target: &TransportTarget,
    preference: Preference,
    commander: Arc<dyn HostCommander>,
    timeout: Duration,
) -> TransportResult<BoundTransport> {
    let options = match preference {
        Preference::Ssh => target
            .ssh
            .clone()
            .map(TransportOptions::Ssh)
            .ok_or_else(|| TransportError::Unavailable {
                host: target.host.clone(),
                requested: "ssh".to_string(),
            })?,
        Preference::Winrm => target
            .winrm
            .clone()
            .map(TransportOptions::Winrm)
            .ok_or_else(|| TransportError::Unavailable {
                host: target.host.clone(),
                requested: "winrm".to_string(),
            })?,
        Preference::Auto => target
            .ssh
            .clone()
            .map(TransportOptions::Ssh)
            .or_else(|| target.winrm.clone().map(TransportOptions::Winrm))
            .ok_or_else(|| TransportError::Unavailable {
                host: target.host.clone(),
                requested: "any".to_string(),
            })?,
    };

    debug!(host = %target.host, transport = options.kind(), "selected transport");

    Ok(BoundTransport {
        host: target.host.clone(),
        options,
        commander,
        timeout,
    })
}

/// A host bound to one resolved transport and one executor.
///
/// Every operation is wrapped in the configured timeout; a command that
/// runs but exits non-zero surfaces as [`TransportError::CommandFailed`],
/// a command that overruns surfaces as [`TransportError::Timeout`].
pub struct BoundTransport {
    host: String,
    options: TransportOptions,
    commander: Arc<dyn HostCommander>,
    timeout: Duration,
}

impl std::fmt::Debug for BoundTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundTransport")
            .field("host", &self.host)
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BoundTransport {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Trigger a configuration-convergence run.
    pub async fn chef_client(&self) -> TransportResult<CommandOutput> {
        self.checked(self.commander.chef_client(&self.host, &self.options))
            .await
    }

    /// Distribute the encrypted-data-bag secret.
    pub async fn put_secret(&self, secret: &str) -> TransportResult<CommandOutput> {
        self.checked(
            self.commander.put_secret(&self.host, secret, &self.options),
        )
        .await
    }

    /// Run the given script lines, preserving order.
    pub async fn ruby_script(
        &self,
        command_lines: &[String],
    ) -> TransportResult<CommandOutput> {
        self.checked(
            self.commander
                .ruby_script(&self.host, command_lines, &self.options),
        )
        .await
    }

    /// Run an arbitrary command string.
    pub async fn run(&self, command: &str) -> TransportResult<CommandOutput> {
        self.checked(self.commander.run(&self.host, command, &self.options))
            .await
    }

    /// Run a rendered bootstrap invocation.
    ///
    /// Bootstrap is a raw command at the transport level; the provisioning
    /// template lives with the caller.
    pub async fn bootstrap(&self, command: &str) -> TransportResult<CommandOutput> {
        debug!(host = %self.host, transport = self.options.kind(), "running bootstrap");
        self.checked(self.commander.run(&self.host, command, &self.options))
            .await
    }

    /// Enforce the timeout and promote non-zero exits to errors.
    async fn checked<F>(&self, fut: F) -> TransportResult<CommandOutput>
    where
        F: std::future::Future<Output = TransportResult<CommandOutput>>,
    {
        let output = tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| TransportError::Timeout {
                host: self.host.clone(),
                secs: self.timeout.as_secs(),
            })??;

        if output.success() {
            Ok(output)
        } else {
            Err(TransportError::CommandFailed {
                host: output.host,
                exit_status: output.exit_status,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}
