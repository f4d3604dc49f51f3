//! Bootstrap task — initial provisioning of one or more hosts.
//!
//! Hosts are independent, so the task fans out across them with a bounded
//! number in flight at once. One outcome is collected per host; a failing
//! host never discards another host's result. The provisioning script
//! template itself lives outside this crate — at this level a bootstrap is
//! a secret drop followed by a raw invocation through the executor.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use tiller_core::{CommandOutput, TransportTarget};
use tiller_transport::{select, HostCommander, Preference, TransportError};

use crate::error::{NodeError, NodeResult};

/// Caller-supplied material for a bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Path to the validator credential used for initial registration.
    pub validator_path: PathBuf,
    /// Secret material to place on each host before first converge.
    pub encrypted_data_bag_secret: Option<String>,
    /// Run list the node should converge with on first boot.
    pub run_list: Vec<String>,
}

impl BootstrapOptions {
    /// Render the raw invocation executed on each host.
    pub fn render_command(&self) -> String {
        let mut command = format!(
            "chef-client --validation-key {}",
            self.validator_path.display()
        );
        if !self.run_list.is_empty() {
            command.push_str(" --runlist ");
            command.push_str(&self.run_list.join(","));
        }
        command
    }
}

/// The result of bootstrapping one host.
#[derive(Debug)]
pub struct HostOutcome {
    pub host: String,
    pub outcome: Result<CommandOutput, TransportError>,
}

impl HostOutcome {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-host detail for a bootstrap run where at least one host failed.
///
/// Successful hosts are retained alongside the failures.
#[derive(Debug)]
pub struct BootstrapFailure {
    pub outcomes: Vec<HostOutcome>,
}

impl BootstrapFailure {
    pub fn failed(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }
}

impl fmt::Display for BootstrapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<&str> = self.failed().map(|o| o.host.as_str()).collect();
        write!(
            f,
            "bootstrap failed on {} of {} hosts: {}",
            failed.len(),
            self.outcomes.len(),
            failed.join(", ")
        )
    }
}

/// A bootstrap task bound to a set of hosts and options.
pub struct Bootstrapper {
    targets: Vec<TransportTarget>,
    options: BootstrapOptions,
    commander: Arc<dyn HostCommander>,
    preference: Preference,
    /// Per-host timeout for each remote operation.
    operation_timeout: Duration,
    /// Deadline for the entire run across all hosts.
    deadline: Duration,
    /// Ceiling on hosts bootstrapped concurrently.
    max_concurrent: usize,
}

impl Bootstrapper {
    pub fn new(
        targets: Vec<TransportTarget>,
        options: BootstrapOptions,
        commander: Arc<dyn HostCommander>,
        preference: Preference,
        operation_timeout: Duration,
        deadline: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            targets,
            options,
            commander,
            preference,
            operation_timeout,
            deadline,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run the bootstrap across every target.
    ///
    /// Returns one outcome per host in the order the targets were given.
    /// Only the overall deadline aborts the run; individual host failures
    /// are recorded, not raised.
    pub async fn run(&self) -> NodeResult<Vec<HostOutcome>> {
        info!(
            hosts = self.targets.len(),
            max_concurrent = self.max_concurrent,
            "starting bootstrap"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut set: JoinSet<(usize, HostOutcome)> = JoinSet::new();

        for (index, target) in self.targets.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let commander = Arc::clone(&self.commander);
            let command = self.options.render_command();
            let secret = self.options.encrypted_data_bag_secret.clone();
            let preference = self.preference;
            let timeout = self.operation_timeout;

            set.spawn(async move {
                let host = target.host.clone();
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            HostOutcome {
                                host: host.clone(),
                                outcome: Err(TransportError::Connection {
                                    host,
                                    reason: "bootstrap semaphore closed".to_string(),
                                }),
                            },
                        );
                    }
                };

                let outcome = bootstrap_host(
                    &target,
                    preference,
                    commander,
                    timeout,
                    secret.as_deref(),
                    &command,
                )
                .await;
                drop(permit);

                (index, HostOutcome { host, outcome })
            });
        }

        let collect = async {
            let mut outcomes = Vec::with_capacity(self.targets.len());
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(indexed) => outcomes.push(indexed),
                    Err(error) => warn!(%error, "bootstrap task aborted"),
                }
            }
            outcomes
        };

        let mut outcomes = tokio::time::timeout(self.deadline, collect)
            .await
            .map_err(|_| NodeError::Deadline {
                secs: self.deadline.as_secs(),
            })?;

        // Restore the caller's host order.
        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<HostOutcome> =
            outcomes.into_iter().map(|(_, outcome)| outcome).collect();

        let failures = outcomes.iter().filter(|o| !o.succeeded()).count();
        info!(
            hosts = outcomes.len(),
            failures, "bootstrap finished"
        );
        Ok(outcomes)
    }
}

/// Bootstrap a single host: drop the secret, then run the invocation.
async fn bootstrap_host(
    target: &TransportTarget,
    preference: Preference,
    commander: Arc<dyn HostCommander>,
    timeout: Duration,
    secret: Option<&str>,
    command: &str,
) -> Result<CommandOutput, TransportError> {
    let bound = select(target, preference, commander, timeout)?;

    if let Some(secret) = secret {
        debug!(host = %target.host, "placing encrypted data bag secret");
        bound.put_secret(secret).await?;
    }

    bound.bootstrap(command).await
}
