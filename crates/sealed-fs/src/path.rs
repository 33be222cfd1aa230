//! Remote path handling
//!
//! Destinations live on the managed side and are POSIX paths: `/` is the
//! only separator and every other byte, `\` included, belongs to a name.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A destination-side path, stored exactly as given.
///
/// Trailing separators are preserved: a trailing `/` is meaningful because
/// it marks a directory-style request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    inner: String,
}

impl RemotePath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path ends with a separator (directory-style request).
    pub fn has_trailing_separator(&self) -> bool {
        self.inner.len() > 1 && self.inner.ends_with('/')
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if segment.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.is_empty() {
            segment.to_string()
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Replace a leading `~` with the given home directory.
    ///
    /// Only the bare `~` and `~/...` forms name the current user's home.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OtherUserHome`] for `~user/...`, which would
    /// otherwise be taken as a relative path.
    pub fn expand_home(&self, home: &str) -> Result<Self> {
        let home = home.trim_end_matches('/');
        if self.inner == "~" {
            Ok(Self::new(home))
        } else if let Some(rest) = self.inner.strip_prefix("~/") {
            Ok(Self {
                inner: format!("{}/{}", home, rest),
            })
        } else if self.inner.starts_with('~') {
            Err(Error::OtherUserHome {
                path: self.inner.clone(),
            })
        } else {
            Ok(self.clone())
        }
    }
}

impl AsRef<Path> for RemotePath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for RemotePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RemotePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for RemotePath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for RemotePath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Suffixes marking a file as ciphertext
const CIPHERTEXT_SUFFIXES: &[&str] = &[".gpg", ".asc", ".pgp"];

/// Basename of a local source file, echoed to installers for provenance.
pub fn source_basename(source: &Path) -> Result<String> {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NoFileName {
            path: source.to_path_buf(),
        })
}

/// Name the decrypted file takes at a destination directory: the source
/// basename with any ciphertext suffix removed.
pub fn plaintext_name(source: &Path) -> Result<String> {
    let base = source_basename(source)?;
    let stripped = CIPHERTEXT_SUFFIXES
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty());
    Ok(stripped.map(str::to_string).unwrap_or(base))
}
