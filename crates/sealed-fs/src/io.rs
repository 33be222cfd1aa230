//! Atomic I/O operations with file locking
//!
//! Every file written here is created owner-only (0600 on unix) so plaintext
//! is never readable by other users, not even for the lifetime of a temp file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::{Error, Result};

/// Mode applied to every file created by this module
const PRIVATE_MODE: u32 = 0o600;

/// Delay between lock attempts
const LOCK_POLL: Duration = Duration::from_millis(25);

/// Tuning for [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying an advisory lock before giving up
    pub lock_timeout: Duration,
    /// Whether to fsync the temp file before renaming it into place
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

fn create_private(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_MODE);
    }
    options.open(path).map_err(|e| Error::io(path, e))
}

fn lock_with_timeout(file: &File, path: &Path, timeout: Duration) -> Result<()> {
    let started = Instant::now();
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(_) if started.elapsed() < timeout => std::thread::sleep(LOCK_POLL),
            Err(_) => {
                return Err(Error::LockFailed {
                    path: path.to_path_buf(),
                });
            }
        }
    }
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so the destination either keeps its old
/// content or holds the new content in full. The temp file is removed if any
/// step fails.
pub fn write_atomic(path: &Path, content: &[u8], config: RobustnessConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = write_and_rename(path, &temp_path, content, config);
    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
        }
    }
    result
}

fn write_and_rename(
    path: &Path,
    temp_path: &Path,
    content: &[u8],
    config: RobustnessConfig,
) -> Result<()> {
    let mut temp_file = create_private(temp_path)?;
    lock_with_timeout(&temp_file, path, config.lock_timeout)?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    if config.enable_fsync {
        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(temp_path, path).map_err(|e| Error::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file atomically");
    Ok(())
}

/// Write content to a fresh owner-only file.
///
/// Used for staging: the file is created with restrictive permissions from
/// the start rather than tightened after the fact.
pub fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = create_private(path)?;
    file.write_all(content).map_err(|e| Error::io(path, e))?;
    file.sync_all().map_err(|e| Error::io(path, e))
}
