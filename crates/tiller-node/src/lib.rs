//! tiller-node — the node resource: merge engine, bootstrap, and dispatch.
//!
//! A node's state is partially owned by the remote configuration server
//! and partially mutated locally before being reconciled back. This crate
//! holds the two hard pieces of that story:
//!
//! - the merge engine ([`merge`]): ordered-set union for run lists and
//!   recursive deep-merge for attribute trees;
//! - the command dispatcher ([`resource::NodeResource`]): bootstrap,
//!   convergence runs, script execution, and secret distribution routed
//!   over whichever transport (SSH or WinRM) the target carries.
//!
//! ```text
//! caller
//!   └── NodeResource
//!       ├── NodeStore (fetch) ──► merge engine ──► reconciled record
//!       └── TransportSelector ──► BoundTransport ──► HostCommander
//!             bootstrap / chef_run / put_secret / ruby_script / run
//! ```

pub mod bootstrap;
pub mod error;
pub mod merge;
pub mod resource;
pub mod store;

pub use bootstrap::{BootstrapFailure, BootstrapOptions, Bootstrapper, HostOutcome};
pub use error::{NodeError, NodeResult};
pub use resource::{DispatchConfig, NodeResource};
pub use store::{InMemoryNodeStore, NodeStore};
