//! Shared types used across Tiller crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An attribute tree: nested string-keyed mappings of JSON values.
pub type Attributes = Map<String, Value>;

/// A node's authoritative record as held by the configuration server.
///
/// The merge engine only ever touches `run_list` and `normal`; every other
/// field is server-managed and passes through fetch/save untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique node name.
    pub name: String,
    /// Environment the node converges in.
    #[serde(default = "default_environment")]
    pub chef_environment: String,
    /// Ordered recipe/role identifiers; a set with insertion order kept.
    #[serde(default)]
    pub run_list: Vec<String>,
    /// Locally-overridable attribute tree.
    #[serde(default)]
    pub normal: Attributes,
    /// Attributes collected by the node itself on its last converge.
    #[serde(default)]
    pub automatic: Attributes,
    /// Cookbook-supplied default attributes.
    #[serde(default, rename = "default")]
    pub default_attributes: Attributes,
    /// Cookbook-supplied override attributes.
    #[serde(default, rename = "override")]
    pub override_attributes: Attributes,
    /// Anything else the server sends (`chef_type`, `json_class`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_environment() -> String {
    "_default".to_string()
}

impl NodeRecord {
    /// Create a fresh record with empty run list and attributes.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chef_environment: default_environment(),
            run_list: Vec::new(),
            normal: Attributes::new(),
            automatic: Attributes::new(),
            default_attributes: Attributes::new(),
            override_attributes: Attributes::new(),
            extra: Map::new(),
        }
    }
}

/// A caller-supplied desired-state change for one node.
///
/// Never persisted itself; consumed by the merge engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredChange {
    /// Identifiers to union into the node's run list.
    #[serde(default)]
    pub run_list: Vec<String>,
    /// Attribute tree to deep-merge into the node's normal attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

/// SSH connection options for a target host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshOptions {
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Private key files to offer, in order.
    #[serde(default)]
    pub keys: Vec<PathBuf>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Whether to wrap remote commands in sudo.
    #[serde(default)]
    pub sudo: bool,
}

fn default_ssh_port() -> u16 {
    22
}

/// WinRM connection options for a target host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinrmOptions {
    pub user: String,
    pub password: String,
    #[serde(default = "default_winrm_port")]
    pub port: u16,
}

fn default_winrm_port() -> u16 {
    5985
}

/// A host paired with whichever transport configurations it carries.
///
/// Both transports may be present; exactly one is selected per dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportTarget {
    pub host: String,
    #[serde(default)]
    pub ssh: Option<SshOptions>,
    #[serde(default)]
    pub winrm: Option<WinrmOptions>,
}

impl TransportTarget {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ssh: None,
            winrm: None,
        }
    }

    pub fn with_ssh(mut self, ssh: SshOptions) -> Self {
        self.ssh = Some(ssh);
        self
    }

    pub fn with_winrm(mut self, winrm: WinrmOptions) -> Self {
        self.winrm = Some(winrm);
        self
    }
}

/// Captured outcome of one remote command on one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub host: String,
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// An all-empty success marker for the given host.
    pub fn ok(host: &str) -> Self {
        Self {
            host: host.to_string(),
            exit_status: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}
