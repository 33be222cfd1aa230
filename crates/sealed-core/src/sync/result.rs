//! The outcome of one sync run

use serde::{Deserialize, Serialize};

use sealed_fs::Fingerprint;

use crate::error::{Error, Phase};

/// Before/after fingerprints suitable for diff-style reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumDiff {
    /// Remote state label: a fingerprint, or `absent`/`unknown`
    pub before: String,
    pub after: Fingerprint,
}

/// Outcome of a sync run.
///
/// Built once when the run ends. When `failed` is set, `changed` carries no
/// meaning. When `changed` is false no content was transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Destination content differs (or would differ in check mode)
    pub changed: bool,
    pub failed: bool,
    /// Failure message naming the phase, or installer notes on success
    pub message: Option<String>,
    /// Phase the failure came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    /// Final resolved destination
    pub dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ChecksumDiff>,
    /// The installer adjusted permissions or ownership
    pub metadata_changed: bool,
    /// Nothing was transferred; `changed` is an intent
    pub check_mode: bool,
    /// Non-fatal problems such as a failed staging cleanup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SyncResult {
    /// A run that reached a success terminal state
    pub(crate) fn succeeded(
        changed: bool,
        dest: String,
        diff: ChecksumDiff,
        metadata_changed: bool,
        check_mode: bool,
        notes: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            changed,
            failed: false,
            message: (!notes.is_empty()).then(|| notes.join("; ")),
            phase: None,
            dest: Some(dest),
            diff: Some(diff),
            metadata_changed,
            check_mode,
            warnings,
        }
    }

    /// A run that stopped at a fatal error
    pub fn failed(error: &Error) -> Self {
        let phase = error.phase();
        Self {
            changed: false,
            failed: true,
            message: Some(format!("{} failed: {}", phase, error)),
            phase: Some(phase),
            dest: None,
            diff: None,
            metadata_changed: false,
            check_mode: false,
            warnings: Vec::new(),
        }
    }

    /// Fingerprint of the plaintext that was (or would be) installed
    pub fn after(&self) -> Option<&Fingerprint> {
        self.diff.as_ref().map(|d| &d.after)
    }

    /// Label of what the destination held before the run
    pub fn before(&self) -> Option<&str> {
        self.diff.as_ref().map(|d| d.before.as_str())
    }
}
