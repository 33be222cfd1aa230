//! Sync request and options

use std::path::PathBuf;

use sealed_fs::RemotePath;

use crate::error::{Error, Result};
use crate::install::FileAttributes;

/// One "make this destination hold the decrypted source" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Encrypted source on the controlling host
    pub source: PathBuf,
    /// Requested destination; a trailing `/` means "inside this directory"
    pub dest: String,
    /// Replace differing content (default true). Missing or unreadable
    /// destinations are installed regardless.
    pub force: bool,
    /// Not supported in template-install mode; present only to be rejected
    pub state: Option<String>,
    /// Staging location supplied by an enclosing run, reused instead of
    /// creating a new one
    pub staging: Option<RemotePath>,
    /// Permission fixup for the installed file
    pub attributes: FileAttributes,
    /// User the installer runs as, when it differs from the connecting user
    pub remote_user: Option<String>,
}

impl SyncRequest {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            force: true,
            state: None,
            staging: None,
            attributes: FileAttributes::default(),
            remote_user: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_staging(mut self, staging: impl Into<RemotePath>) -> Self {
        self.staging = Some(staging.into());
        self
    }

    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_remote_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = Some(user.into());
        self
    }

    /// Reject malformed requests before anything touches the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.state.is_some() {
            return Err(Error::usage("'state' cannot be specified on a template"));
        }
        if self.source.as_os_str().is_empty() || self.dest.trim().is_empty() {
            return Err(Error::usage("src and dest are required"));
        }
        Ok(())
    }
}

/// Options that apply to every run of an engine
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Report what would change without transferring anything
    pub check_mode: bool,
    /// Directory relative sources are looked up from
    pub base_dir: Option<PathBuf>,
}
