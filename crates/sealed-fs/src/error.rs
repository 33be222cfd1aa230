//! Error types for sealed-fs

use std::path::PathBuf;

/// Result type for sealed-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sealed-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Invalid fingerprint '{value}': expected sha256:<64 hex digits>")]
    InvalidFingerprint { value: String },

    #[error("Path has no file name: {path}")]
    NoFileName { path: PathBuf },

    #[error("cannot expand {path}: only ~ and ~/ refer to a home directory")]
    OtherUserHome { path: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
