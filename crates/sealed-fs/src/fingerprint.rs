//! SHA-256 content fingerprints
//!
//! Provides a single canonical fingerprint format (`sha256:<hex>`) used for
//! both freshly decrypted plaintext and the bytes already present at a
//! destination, so the two can be compared without moving content around.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

/// Prefix for all fingerprints produced by this module
const PREFIX: &str = "sha256:";

/// Length of a hex-encoded SHA-256 digest
const HEX_LEN: usize = 64;

/// An opaque digest over a byte sequence.
///
/// Two fingerprints are equal iff the underlying bytes were identical.
/// There is deliberately no "empty" or "missing" fingerprint value: a
/// destination that does not exist is modelled by the caller, never by a
/// reserved digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an in-memory byte sequence.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{}{:x}", PREFIX, hasher.finalize()))
    }

    /// Fingerprint everything a reader yields, without buffering it whole.
    pub fn of_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(format!("{}{:x}", PREFIX, hasher.finalize())))
    }

    /// Fingerprint a file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::of_reader(std::io::BufReader::new(file))
    }

    /// The canonical `sha256:<hex>` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Just the hex digest, without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.0[PREFIX.len()..]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s
            .strip_prefix(PREFIX)
            .is_some_and(|hex| {
                hex.len() == HEX_LEN
                    && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            });
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidFingerprint {
                value: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}
