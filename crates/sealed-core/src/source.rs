//! Locating the encrypted source on the controlling host

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Conventional subdirectory for encrypted files next to a playbook or role
const FILES_DIR: &str = "files";

/// Find the encrypted source file.
///
/// An absolute `src` is used as given. A relative one is looked up under
/// `<base>/files/` first, then directly under `<base>` (the working
/// directory when no base is given).
///
/// # Errors
///
/// Returns [`Error::Usage`] if no candidate exists.
pub fn resolve_source(base: Option<&Path>, src: &Path) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = if src.is_absolute() {
        vec![src.to_path_buf()]
    } else {
        match base {
            Some(base) => vec![base.join(FILES_DIR).join(src), base.join(src)],
            None => vec![src.to_path_buf()],
        }
    };

    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
        .ok_or_else(|| {
            Error::usage(format!(
                "source {} not found (looked in: {})",
                src.display(),
                candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}
