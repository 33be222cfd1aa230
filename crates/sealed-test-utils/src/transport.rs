//! [`FakeTransport`]: an in-memory destination host.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use sealed_core::{RemoteError, RemoteResult, RemoteState, Transport};
use sealed_fs::{Fingerprint, RemotePath};

/// Parent of the staging directories a `FakeTransport` creates
const STAGING_ROOT: &str = "/tmp";

const STAGING_PREFIX: &str = ".sealed-tmp-";

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    unknown: BTreeMap<String, String>,
    home: String,
    stat_calls: Vec<String>,
    staging_created: u32,
    fixups: Vec<(Vec<String>, Option<String>)>,
    fail_stat: bool,
    fail_put: bool,
    fail_mkdir: bool,
    fail_remove: bool,
}

fn key(path: &RemotePath) -> String {
    let s = path.as_str();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}

/// A destination host held in memory.
///
/// Clones share state, so a test can keep a handle after giving one to the
/// engine and inspect what happened afterwards.
///
/// # Example
///
/// ```
/// use sealed_test_utils::FakeTransport;
///
/// let transport = FakeTransport::new()
///     .with_dir("/etc/app")
///     .with_file("/etc/app/secret", b"old");
/// assert_eq!(transport.file("/etc/app/secret").unwrap(), b"old");
/// ```
#[derive(Debug, Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    /// An empty host with `/` and the staging root present and home at
    /// `/home/deploy`.
    pub fn new() -> Self {
        let mut state = State {
            home: "/home/deploy".to_string(),
            ..State::default()
        };
        state.dirs.insert("/".to_string());
        state.dirs.insert(STAGING_ROOT.to_string());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_home(self, home: &str) -> Self {
        self.lock().home = home.to_string();
        self
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.lock().dirs.insert(key(&RemotePath::new(path)));
        self
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.lock()
            .files
            .insert(key(&RemotePath::new(path)), content.to_vec());
        self
    }

    /// A path that exists but cannot be fingerprinted.
    pub fn with_unknown(self, path: &str, reason: &str) -> Self {
        self.lock()
            .unknown
            .insert(key(&RemotePath::new(path)), reason.to_string());
        self
    }

    pub fn fail_stat(&self, fail: bool) {
        self.lock().fail_stat = fail;
    }

    pub fn fail_put(&self, fail: bool) {
        self.lock().fail_put = fail;
    }

    pub fn fail_mkdir(&self, fail: bool) {
        self.lock().fail_mkdir = fail;
    }

    pub fn fail_remove(&self, fail: bool) {
        self.lock().fail_remove = fail;
    }

    /// Content of a file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(&key(&RemotePath::new(path))).cloned()
    }

    pub fn write(&self, path: &str, content: &[u8]) {
        self.lock()
            .files
            .insert(key(&RemotePath::new(path)), content.to_vec());
    }

    /// Paths passed to `stat`, in order.
    pub fn stat_calls(&self) -> Vec<String> {
        self.lock().stat_calls.clone()
    }

    /// Number of staging directories ever created.
    pub fn staging_created(&self) -> u32 {
        self.lock().staging_created
    }

    /// Staging directories and staged files still present.
    pub fn live_staging(&self) -> Vec<String> {
        let state = self.lock();
        let marker = format!("/{}", STAGING_PREFIX);
        state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|path| path.contains(&marker))
            .cloned()
            .collect()
    }

    /// Every `fixup_permissions` call as (paths, remote user).
    pub fn fixups(&self) -> Vec<(Vec<String>, Option<String>)> {
        self.lock().fixups.clone()
    }
}

impl Transport for FakeTransport {
    fn expand_user(&self, path: &RemotePath) -> RemoteResult<RemotePath> {
        let home = self.lock().home.clone();
        path.expand_home(&home)
            .map_err(|e| RemoteError::with_source("expand destination", e))
    }

    fn stat(&self, path: &RemotePath) -> RemoteResult<RemoteState> {
        let mut state = self.lock();
        let path = key(path);
        state.stat_calls.push(path.clone());

        if state.fail_stat {
            return Err(RemoteError::new(format!("stat {}: connection reset", path)));
        }
        if let Some(reason) = state.unknown.get(&path) {
            return Ok(RemoteState::Unknown {
                reason: reason.clone(),
            });
        }
        if state.dirs.contains(&path) {
            return Ok(RemoteState::Directory);
        }
        Ok(match state.files.get(&path) {
            Some(content) => RemoteState::File(Fingerprint::of(content)),
            None => RemoteState::Absent,
        })
    }

    fn make_staging_dir(&self) -> RemoteResult<RemotePath> {
        let mut state = self.lock();
        if state.fail_mkdir {
            return Err(RemoteError::new("mkdir: no space left on device"));
        }
        state.staging_created += 1;
        let path = format!("{}/{}{}", STAGING_ROOT, STAGING_PREFIX, state.staging_created);
        state.dirs.insert(path.clone());
        Ok(RemotePath::new(path))
    }

    fn put_file(&self, path: &RemotePath, content: &[u8]) -> RemoteResult<()> {
        let mut state = self.lock();
        if state.fail_put {
            return Err(RemoteError::new(format!("write {}: broken pipe", path)));
        }
        state.files.insert(key(path), content.to_vec());
        Ok(())
    }

    fn fixup_permissions(
        &self,
        paths: &[RemotePath],
        remote_user: Option<&str>,
    ) -> RemoteResult<()> {
        self.lock().fixups.push((
            paths.iter().map(key).collect(),
            remote_user.map(str::to_string),
        ));
        Ok(())
    }

    fn remove_file(&self, path: &RemotePath) -> RemoteResult<()> {
        let mut state = self.lock();
        if state.fail_remove {
            return Err(RemoteError::new(format!("rm {}: permission denied", path)));
        }
        state.files.remove(&key(path));
        Ok(())
    }

    fn remove_dir(&self, path: &RemotePath) -> RemoteResult<()> {
        let mut state = self.lock();
        if state.fail_remove {
            return Err(RemoteError::new(format!("rm -rf {}: permission denied", path)));
        }
        let dir = key(path);
        let prefix = format!("{}/", dir);
        state.files.retain(|p, _| !p.starts_with(&prefix));
        state.dirs.retain(|p| *p != dir && !p.starts_with(&prefix));
        Ok(())
    }
}
