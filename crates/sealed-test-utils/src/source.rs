//! [`SourceDir`]: encrypted sources on the controlling host.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory laid out like a playbook directory, with a
/// `files/` subdirectory for sources.
pub struct SourceDir {
    temp_dir: TempDir,
}

impl Default for SourceDir {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("files")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `files/<name>` with placeholder ciphertext and return its path.
    pub fn add(&self, name: &str) -> PathBuf {
        let path = self.root().join("files").join(name);
        fs::write(&path, b"-----BEGIN PGP MESSAGE-----\n").unwrap();
        path
    }
}
