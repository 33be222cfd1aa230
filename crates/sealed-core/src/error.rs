//! Error types for sealed-core

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::remote::RemoteError;

/// Result type for sealed-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// The step of a transfer that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    /// Creating the staging directory
    Stage,
    /// Writing plaintext into staging
    Upload,
    /// Adjusting staged file permissions for the installing user
    Fixup,
    /// Placing content at the destination
    Install,
    /// Adjusting metadata of an unchanged destination
    Reconcile,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStep::Stage => "staging",
            TransferStep::Upload => "upload",
            TransferStep::Fixup => "permission fixup",
            TransferStep::Install => "install",
            TransferStep::Reconcile => "metadata reconcile",
        };
        f.write_str(name)
    }
}

/// The phase of a run an error originated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Usage,
    Config,
    Decrypt,
    Probe,
    Transfer,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Usage => "usage",
            Phase::Config => "config",
            Phase::Decrypt => "decrypt",
            Phase::Probe => "probe",
            Phase::Transfer => "transfer",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a sync run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing inputs; raised before any side effect
    #[error("{message}")]
    Usage { message: String },

    /// Decryption failed after the bounded retry policy
    #[error(transparent)]
    Decrypt(#[from] sealed_decrypt::DecryptError),

    /// The destination could not be inspected
    #[error("could not get remote checksum for {path}: {source}")]
    Probe {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// The destination resolved to a directory we cannot write a file over
    #[error("destination {path} is a directory")]
    DestinationIsDirectory { path: String },

    /// Handing content or metadata to the destination failed
    #[error("{step} of {dest} failed: {source}")]
    Transfer {
        dest: String,
        step: TransferStep,
        #[source]
        source: RemoteError,
    },

    /// The staging location could not be removed
    #[error("failed to remove staging location {path}: {source}")]
    Cleanup {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// Configuration file could not be parsed or holds invalid values
    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Filesystem error from sealed-fs
    #[error(transparent)]
    Fs(#[from] sealed_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// The phase this error belongs to, for reporting
    pub fn phase(&self) -> Phase {
        match self {
            Error::Usage { .. } => Phase::Usage,
            Error::Decrypt(_) => Phase::Decrypt,
            Error::Probe { .. } | Error::DestinationIsDirectory { .. } => Phase::Probe,
            Error::Transfer { .. } => Phase::Transfer,
            Error::Cleanup { .. } => Phase::Cleanup,
            Error::InvalidConfig { .. } | Error::TomlDe(_) => Phase::Config,
            Error::Fs(_) | Error::Io(_) => Phase::Usage,
        }
    }
}
