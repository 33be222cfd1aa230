//! Run-scoped staging on the destination host
//!
//! Plaintext only ever touches the destination's disk inside a staging
//! location. A [`StagingArea`] removes what it created exactly once: through
//! [`StagingArea::release`] on normal paths, or from `Drop` if the run
//! unwinds or returns early without releasing.

use sealed_fs::RemotePath;

use crate::error::{Error, Result, TransferStep};
use crate::remote::Transport;

pub struct StagingArea<'a> {
    transport: &'a dyn Transport,
    path: RemotePath,
    /// Whether this run created `path` (and so must remove it)
    owned: bool,
    /// Files written into a borrowed staging location
    staged: Vec<RemotePath>,
    released: bool,
}

impl<'a> StagingArea<'a> {
    /// Use `existing` if the caller supplied one, otherwise create a fresh
    /// staging directory.
    pub fn acquire(transport: &'a dyn Transport, existing: Option<&RemotePath>) -> Result<Self> {
        let (path, owned) = match existing {
            Some(path) => {
                tracing::debug!(path = %path, "Reusing caller staging location");
                (path.clone(), false)
            }
            None => {
                let path = transport
                    .make_staging_dir()
                    .map_err(|source| Error::Transfer {
                        dest: "staging".to_string(),
                        step: TransferStep::Stage,
                        source,
                    })?;
                tracing::debug!(path = %path, "Created staging directory");
                (path, true)
            }
        };

        Ok(Self {
            transport,
            path,
            owned,
            staged: Vec::new(),
            released: false,
        })
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Whether this run created the staging location
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Write `content` into the staging location under `name`.
    pub fn stage(&mut self, name: &str, content: &[u8]) -> Result<RemotePath> {
        let staged = self.path.join(name);
        // Track before writing so a partial write is still cleaned up
        self.staged.push(staged.clone());
        self.transport
            .put_file(&staged, content)
            .map_err(|source| Error::Transfer {
                dest: staged.to_string(),
                step: TransferStep::Upload,
                source,
            })?;
        tracing::debug!(path = %staged, bytes = content.len(), "Staged plaintext");
        Ok(staged)
    }

    /// Remove everything this run put in place.
    ///
    /// An owned directory is removed whole; in a borrowed location only the
    /// files staged by this run are removed.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.cleanup()
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.owned {
            self.transport
                .remove_dir(&self.path)
                .map_err(|source| Error::Cleanup {
                    path: self.path.to_string(),
                    source,
                })?;
            tracing::debug!(path = %self.path, "Removed staging directory");
            return Ok(());
        }

        let mut first_error = None;
        for file in self.staged.drain(..) {
            if let Err(source) = self.transport.remove_file(&file) {
                first_error.get_or_insert(Error::Cleanup {
                    path: file.to_string(),
                    source,
                });
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for StagingArea<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        tracing::debug!(path = %self.path, "Staging dropped without release, cleaning up");
        if let Err(e) = self.cleanup() {
            tracing::warn!(error = %e, "Staging cleanup failed");
        }
    }
}
