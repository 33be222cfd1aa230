//! [`RecordingInstaller`]: installs into a [`FakeTransport`] and remembers
//! every call.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sealed_core::{
    FileAttributes, InstallOutcome, InstallRequest, Installer, ReconcileRequest, RemoteError,
    RemoteResult,
};

use crate::transport::FakeTransport;

/// One `install_content` call and the bytes that were staged for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRecord {
    pub request: InstallRequest,
    pub content: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    installs: Vec<InstallRecord>,
    reconciles: Vec<ReconcileRequest>,
    attributes: BTreeMap<String, FileAttributes>,
    fail_install: bool,
    panic_on_install: bool,
}

/// Installer that copies staged content to the destination of a shared
/// [`FakeTransport`].
///
/// Attributes are tracked per path so reconcile can report whether
/// anything would change.
#[derive(Debug, Clone)]
pub struct RecordingInstaller {
    transport: FakeTransport,
    state: Arc<Mutex<State>>,
}

impl RecordingInstaller {
    pub fn new(transport: &FakeTransport) -> Self {
        Self {
            transport: transport.clone(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_install(&self, fail: bool) {
        self.lock().fail_install = fail;
    }

    /// Panic inside `install_content`, after content was staged.
    pub fn panic_on_install(&self, panic: bool) {
        self.lock().panic_on_install = panic;
    }

    pub fn installs(&self) -> Vec<InstallRecord> {
        self.lock().installs.clone()
    }

    pub fn reconciles(&self) -> Vec<ReconcileRequest> {
        self.lock().reconciles.clone()
    }

    /// Attributes last applied to `path`.
    pub fn attributes(&self, path: &str) -> Option<FileAttributes> {
        self.lock().attributes.get(path).copied()
    }
}

/// Merge requested attributes over current ones, returning the changes.
fn diff(current: FileAttributes, requested: FileAttributes) -> (FileAttributes, Vec<String>) {
    let mut merged = current;
    let mut changes = Vec::new();
    if requested.mode.is_some() && requested.mode != current.mode {
        merged.mode = requested.mode;
        changes.push(format!("mode={:04o}", requested.mode.unwrap_or_default()));
    }
    if requested.owner.is_some() && requested.owner != current.owner {
        merged.owner = requested.owner;
        changes.push(format!("owner={}", requested.owner.unwrap_or_default()));
    }
    if requested.group.is_some() && requested.group != current.group {
        merged.group = requested.group;
        changes.push(format!("group={}", requested.group.unwrap_or_default()));
    }
    (merged, changes)
}

impl Installer for RecordingInstaller {
    fn install_content(&self, request: &InstallRequest) -> RemoteResult<InstallOutcome> {
        let (fail, panic) = {
            let state = self.lock();
            (state.fail_install, state.panic_on_install)
        };
        if panic {
            panic!("installer crashed");
        }
        if fail {
            return Err(RemoteError::new(format!("mv to {}: read-only filesystem", request.dest)));
        }

        let content = self
            .transport
            .file(request.staged.as_str())
            .ok_or_else(|| RemoteError::new(format!("{} was not staged", request.staged)))?;
        self.transport.write(request.dest.as_str(), &content);

        let mut state = self.lock();
        let dest = request.dest.to_string();
        let (merged, _) = diff(FileAttributes::default(), request.attributes);
        state.attributes.insert(dest.clone(), merged);
        state.installs.push(InstallRecord {
            request: request.clone(),
            content,
        });
        Ok(InstallOutcome::changed(format!("installed {}", dest)))
    }

    fn reconcile_metadata(&self, request: &ReconcileRequest) -> RemoteResult<InstallOutcome> {
        let mut state = self.lock();
        state.reconciles.push(request.clone());

        let dest = request.dest.to_string();
        let current = state.attributes.get(&dest).copied().unwrap_or_default();
        let (merged, changes) = diff(current, request.attributes);
        if changes.is_empty() {
            return Ok(InstallOutcome::unchanged());
        }
        if !request.check_mode {
            state.attributes.insert(dest, merged);
        }
        Ok(InstallOutcome {
            changed: true,
            messages: changes,
        })
    }
}
