//! Install collaborators
//!
//! The engine decides *whether* to install; an [`Installer`] does the final
//! placement and applies ownership and permissions, possibly under a
//! different privilege context than the one that decrypted.

use std::fmt;

use serde::{Deserialize, Serialize};

use sealed_fs::RemotePath;

use crate::remote::RemoteResult;

/// Permission fixup applied to the installed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Permission bits, e.g. `0o600`
    pub mode: Option<u32>,
    /// Numeric owner id
    pub owner: Option<u32>,
    /// Numeric group id
    pub group: Option<u32>,
}

impl FileAttributes {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.owner.is_none() && self.group.is_none()
    }
}

impl fmt::Display for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(mode) = self.mode {
            parts.push(format!("mode={:04o}", mode));
        }
        if let Some(owner) = self.owner {
            parts.push(format!("owner={}", owner));
        }
        if let Some(group) = self.group {
            parts.push(format!("group={}", group));
        }
        if parts.is_empty() {
            f.write_str("defaults")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// Place staged plaintext at its destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Staged plaintext on the destination host
    pub staged: RemotePath,
    /// Final resolved destination
    pub dest: RemotePath,
    /// Basename of the encrypted source, for provenance
    pub original_basename: String,
    /// Write through a symlink at `dest` rather than replacing it
    pub follow: bool,
    pub attributes: FileAttributes,
}

/// Adjust metadata of a destination whose content is already correct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub dest: RemotePath,
    pub original_basename: String,
    pub follow: bool,
    pub attributes: FileAttributes,
    /// Report what would change without changing it
    pub check_mode: bool,
}

/// What an installer reports back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    /// Whether the installer changed anything
    pub changed: bool,
    /// Human-readable notes echoed into the run result
    pub messages: Vec<String>,
}

impl InstallOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            messages: vec![message.into()],
        }
    }
}

/// Final placement and metadata primitives
pub trait Installer: Send + Sync {
    /// Atomically place `request.staged` at `request.dest` and apply attributes.
    fn install_content(&self, request: &InstallRequest) -> RemoteResult<InstallOutcome>;

    /// Apply attributes to an existing destination. Must not touch content.
    fn reconcile_metadata(&self, request: &ReconcileRequest) -> RemoteResult<InstallOutcome>;
}
