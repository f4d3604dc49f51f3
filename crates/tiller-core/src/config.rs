//! tiller.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{SshOptions, WinrmOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TillerConfig {
    /// Default SSH options applied to every target.
    pub ssh: Option<SshOptions>,
    /// Default WinRM options applied to every target.
    pub winrm: Option<WinrmOptions>,
    /// Secret used to decrypt encrypted data bags, distributed verbatim
    /// by `put_secret`.
    pub encrypted_data_bag_secret: Option<String>,
    pub limits: Option<LimitsConfig>,
}

/// Timeouts and concurrency ceilings for remote operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per-host timeout for a single remote operation, in seconds.
    pub operation_timeout_secs: Option<u64>,
    /// Overall deadline for a multi-host bootstrap run, in seconds.
    pub bootstrap_deadline_secs: Option<u64>,
    /// Maximum hosts operated on concurrently.
    pub max_concurrent_hosts: Option<usize>,
}

impl TillerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TillerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
