//! Decrypted content held in memory

use std::fmt;

use sealed_fs::Fingerprint;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Decrypted bytes produced from exactly one encrypted source.
///
/// Never empty. The buffer is zeroized when the value is dropped, and the
/// `Debug` output never includes the content.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Plaintext {
    bytes: Vec<u8>,
}

impl Plaintext {
    /// Wrap decrypted bytes, rejecting the empty sequence.
    pub fn try_new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.bytes)
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plaintext")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
