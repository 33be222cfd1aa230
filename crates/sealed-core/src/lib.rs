//! Decrypt-compare-install engine for sealed
//!
//! This crate decides whether an encrypted secret needs to be installed at a
//! destination, and installs it only when it does:
//!
//! - **Destination resolution**: trailing-separator rule, `~` expansion and
//!   directory-collision correction
//! - **Remote state probing**: absent, directory, fingerprinted file, or unknown
//! - **SyncEngine**: decrypt, compare fingerprints, then install or only
//!   reconcile metadata
//! - **Staging**: run-scoped, always cleaned up
//!
//! # Architecture
//!
//! ```text
//!                  sealed-cli
//!                      |
//!                 sealed-core  ---- Transport / Installer (destination host)
//!                 /         \
//!       sealed-decrypt    sealed-fs
//! ```
//!
//! The destination host is reached only through [`Transport`] and
//! [`Installer`]. [`LocalTransport`] and [`LocalInstaller`] implement them
//! for the machine the engine runs on.

pub mod config;
pub mod error;
pub mod install;
pub mod local;
pub mod probe;
pub mod remote;
pub mod resolve;
pub mod source;
pub mod staging;
pub mod sync;

pub use config::SealedConfig;
pub use error::{Error, Phase, Result, TransferStep};
pub use install::{FileAttributes, InstallOutcome, InstallRequest, Installer, ReconcileRequest};
pub use local::{LocalInstaller, LocalTransport};
pub use probe::{ProbeReport, RemoteStateProbe};
pub use remote::{RemoteError, RemoteResult, RemoteState, Transport};
pub use resolve::{DestinationResolver, DestinationTarget};
pub use source::resolve_source;
pub use staging::StagingArea;
pub use sync::{ChecksumDiff, Decision, SyncEngine, SyncOptions, SyncRequest, SyncResult};
