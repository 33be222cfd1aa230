//! Transport and installer for the local host
//!
//! Lets the engine manage files on the machine it runs on, which is also
//! how the `sealed` CLI uses it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use sealed_fs::io::{self, RobustnessConfig};
use sealed_fs::{Fingerprint, RemotePath};

use crate::install::{FileAttributes, InstallOutcome, InstallRequest, Installer, ReconcileRequest};
use crate::remote::{RemoteError, RemoteResult, RemoteState, Transport};

/// Prefix of per-run staging directories
const STAGING_PREFIX: &str = ".sealed-tmp-";

/// Mode of staging directories
#[cfg(unix)]
const STAGING_DIR_MODE: u32 = 0o700;

/// Transport over the local filesystem
#[derive(Debug, Clone)]
pub struct LocalTransport {
    staging_root: PathBuf,
    home: Option<PathBuf>,
}

impl LocalTransport {
    /// Stage under the system temp directory and expand `~` to the
    /// current user's home.
    pub fn new() -> Self {
        Self {
            staging_root: std::env::temp_dir(),
            home: dirs::home_dir(),
        }
    }

    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalTransport {
    fn expand_user(&self, path: &RemotePath) -> RemoteResult<RemotePath> {
        if !path.as_str().starts_with('~') {
            return Ok(path.clone());
        }
        let home = self
            .home
            .as_ref()
            .ok_or_else(|| RemoteError::new(format!("cannot expand {}: no home directory", path)))?;
        path.expand_home(&home.to_string_lossy())
            .map_err(|e| RemoteError::with_source("expand destination", e))
    }

    fn stat(&self, path: &RemotePath) -> RemoteResult<RemoteState> {
        let native = path.to_native();
        // Follows symlinks. The installer writes through a symlinked
        // destination, so the target's content is what gets compared.
        // A dangling link stats as Absent.
        let metadata = match fs::metadata(&native) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RemoteState::Absent),
            Err(e) => return Err(RemoteError::with_source(format!("stat {}", path), e)),
        };

        if metadata.is_dir() {
            return Ok(RemoteState::Directory);
        }
        if !metadata.is_file() {
            return Ok(RemoteState::Unknown {
                reason: "not a regular file".to_string(),
            });
        }

        match Fingerprint::of_file(&native) {
            Ok(fp) => Ok(RemoteState::File(fp)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(RemoteState::Unknown {
                reason: e.to_string(),
            }),
            Err(e) => Err(RemoteError::with_source(format!("read {}", path), e)),
        }
    }

    fn make_staging_dir(&self) -> RemoteResult<RemotePath> {
        let dir = self
            .staging_root
            .join(format!("{}{}", STAGING_PREFIX, uuid::Uuid::new_v4()));

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(STAGING_DIR_MODE);
        }
        builder
            .create(&dir)
            .map_err(|e| RemoteError::with_source(format!("create {}", dir.display()), e))?;
        Ok(RemotePath::new(dir))
    }

    fn put_file(&self, path: &RemotePath, content: &[u8]) -> RemoteResult<()> {
        io::write_private(&path.to_native(), content)
            .map_err(|e| RemoteError::with_source(format!("write {}", path), e))
    }

    fn remove_file(&self, path: &RemotePath) -> RemoteResult<()> {
        match fs::remove_file(path.to_native()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RemoteError::with_source(format!("remove {}", path), e)),
        }
    }

    fn remove_dir(&self, path: &RemotePath) -> RemoteResult<()> {
        match fs::remove_dir_all(path.to_native()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RemoteError::with_source(format!("remove {}", path), e)),
        }
    }
}

/// Installer over the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalInstaller {
    robustness: RobustnessConfig,
}

impl LocalInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_robustness(robustness: RobustnessConfig) -> Self {
        Self { robustness }
    }
}

/// Where writes to `dest` should land: through a symlink when following.
fn write_target(dest: &Path, follow: bool) -> PathBuf {
    if follow && fs::symlink_metadata(dest).is_ok_and(|m| m.file_type().is_symlink()) {
        if let Ok(target) = fs::canonicalize(dest) {
            return target;
        }
    }
    dest.to_path_buf()
}

impl Installer for LocalInstaller {
    fn install_content(&self, request: &InstallRequest) -> RemoteResult<InstallOutcome> {
        let staged = Zeroizing::new(
            fs::read(request.staged.to_native())
                .map_err(|e| RemoteError::with_source(format!("read {}", request.staged), e))?,
        );
        let target = write_target(&request.dest.to_native(), request.follow);

        io::write_atomic(&target, &staged, self.robustness)
            .map_err(|e| RemoteError::with_source(format!("install {}", request.dest), e))?;

        let mut messages = vec![format!(
            "installed {} from {}",
            request.dest, request.original_basename
        )];
        messages.extend(
            apply_attributes(&target, &request.attributes, false)
                .map_err(|e| RemoteError::with_source(format!("set attributes on {}", request.dest), e))?,
        );

        Ok(InstallOutcome {
            changed: true,
            messages,
        })
    }

    fn reconcile_metadata(&self, request: &ReconcileRequest) -> RemoteResult<InstallOutcome> {
        let target = write_target(&request.dest.to_native(), request.follow);
        if !target.exists() {
            return Err(RemoteError::new(format!("{} does not exist", request.dest)));
        }

        let messages = apply_attributes(&target, &request.attributes, request.check_mode)
            .map_err(|e| RemoteError::with_source(format!("set attributes on {}", request.dest), e))?;

        Ok(InstallOutcome {
            changed: !messages.is_empty(),
            messages,
        })
    }
}

/// Bring `path` in line with `attributes`, returning one message per change.
/// With `dry_run`, changes are reported but not applied.
#[cfg(unix)]
fn apply_attributes(
    path: &Path,
    attributes: &FileAttributes,
    dry_run: bool,
) -> std::io::Result<Vec<String>> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let metadata = fs::metadata(path)?;
    let mut changes = Vec::new();

    if let Some(mode) = attributes.mode {
        let current = metadata.mode() & 0o7777;
        if current != mode {
            changes.push(format!("mode {:04o} -> {:04o}", current, mode));
            if !dry_run {
                fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    let owner = attributes.owner.filter(|uid| *uid != metadata.uid());
    let group = attributes.group.filter(|gid| *gid != metadata.gid());
    if let Some(uid) = owner {
        changes.push(format!("owner {} -> {}", metadata.uid(), uid));
    }
    if let Some(gid) = group {
        changes.push(format!("group {} -> {}", metadata.gid(), gid));
    }
    if (owner.is_some() || group.is_some()) && !dry_run {
        std::os::unix::fs::chown(path, owner, group)?;
    }

    Ok(changes)
}

#[cfg(not(unix))]
fn apply_attributes(
    path: &Path,
    attributes: &FileAttributes,
    _dry_run: bool,
) -> std::io::Result<Vec<String>> {
    if !attributes.is_empty() {
        tracing::warn!(path = %path.display(), "File attributes are only applied on unix");
    }
    Ok(Vec::new())
}
