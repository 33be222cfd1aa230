//! The destination-side transport boundary
//!
//! Everything the engine needs to know or change about the destination
//! host goes through [`Transport`]. The engine never assumes remote state;
//! it asks.

use std::fmt;

use sealed_fs::{Fingerprint, RemotePath};

/// Failure reported by a transport or installer.
///
/// Transports own their retry policy; by the time one of these reaches the
/// engine it is final.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping its text in the message.
    pub fn with_source(
        context: impl fmt::Display,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: format!("{}: {}", context, source),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for transport and installer calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// What currently sits at a destination path.
///
/// Queried fresh every run. `Absent` and `Unknown` are distinct: a probe
/// that could see a file but not read it never masquerades as a missing file,
/// and an empty file is `File` with the digest of zero bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    /// Nothing exists at the path
    Absent,
    /// A directory exists at the path
    Directory,
    /// A file exists with the given content fingerprint
    File(Fingerprint),
    /// Something exists but its content could not be fingerprinted
    Unknown { reason: String },
}

impl RemoteState {
    pub fn is_directory(&self) -> bool {
        matches!(self, RemoteState::Directory)
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            RemoteState::File(fp) => Some(fp),
            _ => None,
        }
    }

    /// Short label for reporting: the fingerprint, or the state's name.
    pub fn label(&self) -> String {
        match self {
            RemoteState::Absent => "absent".to_string(),
            RemoteState::Directory => "directory".to_string(),
            RemoteState::File(fp) => fp.to_string(),
            RemoteState::Unknown { .. } => "unknown".to_string(),
        }
    }
}

/// Access to the destination host.
pub trait Transport: Send + Sync {
    /// Expand a leading `~` against the remote user's home directory.
    fn expand_user(&self, path: &RemotePath) -> RemoteResult<RemotePath>;

    /// Inspect a path. A missing path is `Ok(RemoteState::Absent)`, not an
    /// error; errors mean the question could not be answered.
    fn stat(&self, path: &RemotePath) -> RemoteResult<RemoteState>;

    /// Create a fresh, private, run-scoped staging directory.
    fn make_staging_dir(&self) -> RemoteResult<RemotePath>;

    /// Write content to a new owner-only file.
    fn put_file(&self, path: &RemotePath, content: &[u8]) -> RemoteResult<()>;

    /// Make staged paths readable by the identity that will install them.
    ///
    /// Only needed when installation runs as a different user than the
    /// one that staged the files.
    fn fixup_permissions(
        &self,
        paths: &[RemotePath],
        remote_user: Option<&str>,
    ) -> RemoteResult<()> {
        tracing::debug!(count = paths.len(), user = ?remote_user, "No permission fixup needed");
        Ok(())
    }

    /// Remove a file. Removing a missing file succeeds.
    fn remove_file(&self, path: &RemotePath) -> RemoteResult<()>;

    /// Remove a directory and everything in it. Removing a missing
    /// directory succeeds.
    fn remove_dir(&self, path: &RemotePath) -> RemoteResult<()>;
}
