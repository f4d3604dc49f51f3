//! Node resource facade — the single entry point for callers.
//!
//! A `NodeResource` composes the remote state client, the merge engine,
//! and the transport-backed command dispatcher. Its ssh/winrm
//! configuration and secret material are fixed at construction and shared
//! read-only by every dispatch, so concurrent calls against different
//! hosts need no coordination.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use tiller_core::{
    CommandOutput, DesiredChange, NodeRecord, SshOptions, TillerConfig,
    TransportTarget, WinrmOptions,
};
use tiller_transport::{select, BoundTransport, HostCommander, Preference, TransportResult};

use crate::bootstrap::{BootstrapFailure, BootstrapOptions, Bootstrapper, HostOutcome};
use crate::error::{NodeError, NodeResult};
use crate::merge;
use crate::store::NodeStore;

/// Transport and scheduling settings shared by every dispatch.
///
/// Immutable once the resource is constructed.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub ssh: Option<SshOptions>,
    pub winrm: Option<WinrmOptions>,
    pub preference: Preference,
    /// Per-host timeout for one remote operation.
    pub operation_timeout: Duration,
    /// Overall deadline for a multi-host bootstrap run.
    pub bootstrap_deadline: Duration,
    /// Ceiling on hosts operated on concurrently.
    pub max_concurrent_hosts: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ssh: None,
            winrm: None,
            preference: Preference::Auto,
            operation_timeout: Duration::from_secs(120),
            bootstrap_deadline: Duration::from_secs(900),
            max_concurrent_hosts: 16,
        }
    }
}

impl DispatchConfig {
    /// Build dispatch settings from a parsed `tiller.toml`.
    pub fn from_config(config: &TillerConfig) -> Self {
        let defaults = Self::default();
        let limits = config.limits.as_ref();
        Self {
            ssh: config.ssh.clone(),
            winrm: config.winrm.clone(),
            preference: Preference::Auto,
            operation_timeout: limits
                .and_then(|l| l.operation_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.operation_timeout),
            bootstrap_deadline: limits
                .and_then(|l| l.bootstrap_deadline_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.bootstrap_deadline),
            max_concurrent_hosts: limits
                .and_then(|l| l.max_concurrent_hosts)
                .unwrap_or(defaults.max_concurrent_hosts),
        }
    }
}

/// The logical handle for one managed host's configuration state and the
/// remote operations available against it.
pub struct NodeResource {
    store: Arc<dyn NodeStore>,
    commander: Arc<dyn HostCommander>,
    dispatch: DispatchConfig,
    encrypted_data_bag_secret: Option<String>,
    save_on_merge: bool,
}

impl NodeResource {
    pub fn new(
        store: Arc<dyn NodeStore>,
        commander: Arc<dyn HostCommander>,
        dispatch: DispatchConfig,
    ) -> Self {
        Self {
            store,
            commander,
            dispatch,
            encrypted_data_bag_secret: None,
            save_on_merge: false,
        }
    }

    /// Set the encrypted-data-bag secret distributed by `put_secret`.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.encrypted_data_bag_secret = Some(secret.into());
        self
    }

    /// Persist the reconciled record as part of `merge_data`.
    ///
    /// Off by default: merging computes, the caller decides to save.
    pub fn save_on_merge(mut self, save: bool) -> Self {
        self.save_on_merge = save;
        self
    }

    pub fn ssh(&self) -> Option<&SshOptions> {
        self.dispatch.ssh.as_ref()
    }

    pub fn winrm(&self) -> Option<&WinrmOptions> {
        self.dispatch.winrm.as_ref()
    }

    /// Reconcile a desired change with the node's current server record.
    ///
    /// Fetches the record by name, unions the run list, deep-merges the
    /// normal attributes, and returns the result. Fails with
    /// [`NodeError::NotFound`] when no record exists; nothing is mutated
    /// in that case.
    pub async fn merge_data(
        &self,
        name: &str,
        change: &DesiredChange,
    ) -> NodeResult<NodeRecord> {
        let mut record = self
            .store
            .fetch(name)
            .await?
            .ok_or_else(|| NodeError::NotFound(name.to_string()))?;

        merge::apply_change(&mut record, change);
        info!(
            node = %name,
            run_list_len = record.run_list.len(),
            "merged desired state"
        );

        if self.save_on_merge {
            debug!(node = %name, "persisting merged record");
            return self.store.save(record).await;
        }
        Ok(record)
    }

    /// Bootstrap one or more hosts with this resource's transport state.
    ///
    /// Hosts run concurrently under the configured ceiling; one outcome is
    /// collected per host. Any host failure yields
    /// [`NodeError::Bootstrap`] carrying every outcome, successes
    /// included.
    pub async fn bootstrap(
        &self,
        hosts: &[&str],
        mut options: BootstrapOptions,
    ) -> NodeResult<Vec<HostOutcome>> {
        if options.encrypted_data_bag_secret.is_none() {
            options.encrypted_data_bag_secret = self.encrypted_data_bag_secret.clone();
        }

        let targets: Vec<TransportTarget> =
            hosts.iter().map(|host| self.target(host)).collect();

        let bootstrapper = Bootstrapper::new(
            targets,
            options,
            Arc::clone(&self.commander),
            self.dispatch.preference,
            self.dispatch.operation_timeout,
            self.dispatch.bootstrap_deadline,
            self.dispatch.max_concurrent_hosts,
        );

        let outcomes = bootstrapper.run().await?;
        if outcomes.iter().any(|o| !o.succeeded()) {
            return Err(NodeError::Bootstrap(BootstrapFailure { outcomes }));
        }
        Ok(outcomes)
    }

    /// Issue a configuration-convergence run on the host.
    pub async fn chef_run(&self, host: &str) -> NodeResult<CommandOutput> {
        debug!(%host, "chef run");
        Ok(self.bind(host)?.chef_client().await?)
    }

    /// Transmit the resource's configured secret to the host.
    pub async fn put_secret(&self, host: &str) -> NodeResult<CommandOutput> {
        let secret = self
            .encrypted_data_bag_secret
            .as_deref()
            .ok_or(NodeError::MissingSecret)?;
        debug!(%host, "putting secret");
        Ok(self.bind(host)?.put_secret(secret).await?)
    }

    /// Execute the given lines as a Ruby script on the host, in order.
    pub async fn ruby_script(
        &self,
        host: &str,
        command_lines: &[String],
    ) -> NodeResult<CommandOutput> {
        debug!(%host, lines = command_lines.len(), "ruby script");
        Ok(self.bind(host)?.ruby_script(command_lines).await?)
    }

    /// Execute an arbitrary command string on the host.
    pub async fn execute_command(
        &self,
        host: &str,
        command: &str,
    ) -> NodeResult<CommandOutput> {
        debug!(%host, %command, "execute command");
        Ok(self.bind(host)?.run(command).await?)
    }

    /// The resource's own transport state applied to one host.
    fn target(&self, host: &str) -> TransportTarget {
        TransportTarget {
            host: host.to_string(),
            ssh: self.dispatch.ssh.clone(),
            winrm: self.dispatch.winrm.clone(),
        }
    }

    fn bind(&self, host: &str) -> TransportResult<BoundTransport> {
        select(
            &self.target(host),
            self.dispatch.preference,
            Arc::clone(&self.commander),
            self.dispatch.operation_timeout,
        )
    }
}
