//! SyncEngine implementation
//!
//! One run is a strictly sequential flow:
//!
//! ```text
//! resolve -> probe (-> re-probe) -> decrypt -> fingerprint -> decide
//!     -> [stage -> install -> release] | [reconcile metadata]
//! ```
//!
//! No plaintext is transferred unless the destination is missing, unknown,
//! or (with `force`) differs.

use sealed_decrypt::{Decryptor, Plaintext};
use sealed_fs::{Fingerprint, RemotePath, plaintext_name, source_basename};

use crate::error::{Error, Result, TransferStep};
use crate::install::{InstallOutcome, InstallRequest, Installer, ReconcileRequest};
use crate::probe::{ProbeReport, RemoteStateProbe};
use crate::remote::{RemoteState, Transport};
use crate::resolve::DestinationResolver;
use crate::source::resolve_source;
use crate::staging::StagingArea;

use super::request::{SyncOptions, SyncRequest};
use super::result::{ChecksumDiff, SyncResult};

/// Name of the staged plaintext inside a staging directory this run created.
/// In a borrowed location it gets a unique suffix so nothing there is
/// overwritten.
const STAGED_NAME: &str = "source";

/// What a run does once it knows both fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Transfer the plaintext and install it
    Install,
    /// Content matches (or may not be replaced); only fix metadata
    ReconcileOnly,
}

impl Decision {
    /// Decide from the destination's state and the local fingerprint.
    ///
    /// A missing or unreadable destination is always installed, whatever
    /// `force` says. An existing file is replaced only when `force` is set
    /// and the fingerprints differ.
    pub fn decide(remote: &RemoteState, local: &Fingerprint, force: bool) -> Self {
        match remote {
            RemoteState::Absent | RemoteState::Unknown { .. } => Decision::Install,
            RemoteState::File(current) if force && current != local => Decision::Install,
            RemoteState::File(_) | RemoteState::Directory => Decision::ReconcileOnly,
        }
    }
}

/// Engine for syncing decrypted secrets to a destination
///
/// Holds no state between runs; independent runs may share one engine.
pub struct SyncEngine {
    transport: Box<dyn Transport>,
    installer: Box<dyn Installer>,
    decryptor: Decryptor,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        transport: impl Transport + 'static,
        installer: impl Installer + 'static,
        decryptor: Decryptor,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            installer: Box::new(installer),
            decryptor,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run a sync and fold any failure into the result.
    pub fn sync(&self, request: &SyncRequest) -> SyncResult {
        match self.try_sync(request) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(phase = %e.phase(), error = %e, "Sync failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Run a sync, returning the first fatal error.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] for invalid requests or a missing source
    /// - [`Error::Probe`] / [`Error::DestinationIsDirectory`] if the
    ///   destination cannot be inspected or cannot hold a file
    /// - [`Error::Decrypt`] if decryption fails
    /// - [`Error::Transfer`] if staging, install, or reconcile fails
    pub fn try_sync(&self, request: &SyncRequest) -> Result<SyncResult> {
        request.validate()?;

        let source = resolve_source(self.options.base_dir.as_deref(), &request.source)?;
        let original_basename = source_basename(&source)?;
        let name = plaintext_name(&source)?;

        let target = DestinationResolver::new(self.transport.as_ref()).resolve(&request.dest, &name)?;
        let ProbeReport { target, state } =
            RemoteStateProbe::new(self.transport.as_ref()).probe(target, &name)?;

        if state.is_directory() {
            return Err(Error::DestinationIsDirectory {
                path: target.path.to_string(),
            });
        }

        let plaintext = self.decryptor.decrypt(&source)?;
        let local = plaintext.fingerprint();
        let decision = Decision::decide(&state, &local, request.force);
        tracing::debug!(
            dest = %target.path,
            before = %state.label(),
            after = %local,
            force = request.force,
            ?decision,
            "Decided"
        );

        let diff = ChecksumDiff {
            before: state.label(),
            after: local,
        };
        let check_mode = self.options.check_mode;

        match decision {
            Decision::Install if check_mode => {
                tracing::info!(dest = %target.path, "Would install (check mode)");
                Ok(SyncResult::succeeded(
                    true,
                    target.path.to_string(),
                    diff,
                    false,
                    true,
                    Vec::new(),
                    Vec::new(),
                ))
            }
            Decision::Install => {
                let (outcome, warnings) =
                    self.install(request, &target.path, &original_basename, &plaintext)?;
                drop(plaintext);
                tracing::info!(dest = %target.path, "Installed decrypted content");
                Ok(SyncResult::succeeded(
                    true,
                    target.path.to_string(),
                    diff,
                    false,
                    false,
                    outcome.messages,
                    warnings,
                ))
            }
            Decision::ReconcileOnly => {
                drop(plaintext);
                let outcome = self.reconcile(request, &target.path, &original_basename)?;
                tracing::info!(
                    dest = %target.path,
                    metadata_changed = outcome.changed,
                    "Content unchanged, reconciled metadata"
                );
                Ok(SyncResult::succeeded(
                    false,
                    target.path.to_string(),
                    diff,
                    outcome.changed,
                    check_mode,
                    outcome.messages,
                    Vec::new(),
                ))
            }
        }
    }

    /// Stage, install, and release. Staging is released on every path; a
    /// release failure is reported as a warning unless the install itself
    /// already failed, in which case the install error wins.
    fn install(
        &self,
        request: &SyncRequest,
        dest: &RemotePath,
        original_basename: &str,
        plaintext: &Plaintext,
    ) -> Result<(InstallOutcome, Vec<String>)> {
        let mut staging = StagingArea::acquire(self.transport.as_ref(), request.staging.as_ref())?;

        let outcome = self.transfer(&mut staging, request, dest, original_basename, plaintext);
        let cleanup = staging.release();

        match (outcome, cleanup) {
            (Ok(outcome), Ok(())) => Ok((outcome, Vec::new())),
            (Ok(outcome), Err(cleanup)) => {
                tracing::warn!(error = %cleanup, "Staging cleanup failed after install");
                Ok((outcome, vec![cleanup.to_string()]))
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                tracing::warn!(error = %cleanup, "Staging cleanup failed after error");
                Err(e)
            }
        }
    }

    fn transfer(
        &self,
        staging: &mut StagingArea<'_>,
        request: &SyncRequest,
        dest: &RemotePath,
        original_basename: &str,
        plaintext: &Plaintext,
    ) -> Result<InstallOutcome> {
        let name = if staging.is_owned() {
            STAGED_NAME.to_string()
        } else {
            format!("{}-{}", STAGED_NAME, uuid::Uuid::new_v4())
        };
        let staged = staging.stage(&name, plaintext.as_bytes())?;

        self.transport
            .fixup_permissions(
                &[staging.path().clone(), staged.clone()],
                request.remote_user.as_deref(),
            )
            .map_err(|source| Error::Transfer {
                dest: dest.to_string(),
                step: TransferStep::Fixup,
                source,
            })?;

        let install = InstallRequest {
            staged,
            dest: dest.clone(),
            original_basename: original_basename.to_string(),
            follow: true,
            attributes: request.attributes,
        };
        self.installer
            .install_content(&install)
            .map_err(|source| Error::Transfer {
                dest: dest.to_string(),
                step: TransferStep::Install,
                source,
            })
    }

    fn reconcile(
        &self,
        request: &SyncRequest,
        dest: &RemotePath,
        original_basename: &str,
    ) -> Result<InstallOutcome> {
        let reconcile = ReconcileRequest {
            dest: dest.clone(),
            original_basename: original_basename.to_string(),
            follow: true,
            attributes: request.attributes,
            check_mode: self.options.check_mode,
        };
        self.installer
            .reconcile_metadata(&reconcile)
            .map_err(|source| Error::Transfer {
                dest: dest.to_string(),
                step: TransferStep::Reconcile,
                source,
            })
    }
}
