//! tiller-transport — transport selection and the remote execution boundary.
//!
//! A [`TransportTarget`](tiller_core::TransportTarget) may carry SSH and/or
//! WinRM configuration. [`select`] resolves exactly one per dispatch and
//! binds it to a [`HostCommander`] implementation, producing a
//! [`BoundTransport`] that enforces per-operation timeouts and promotes
//! command failures to typed errors.

pub mod commander;
pub mod error;
pub mod selector;

pub use commander::{HostCommander, TransportOptions};
pub use error::{TransportError, TransportResult};
pub use selector::{select, BoundTransport, Preference};
