//! Filesystem primitives for sealed
//!
//! Provides content fingerprints, remote path handling and atomic,
//! permission-safe writes for plaintext that must never linger on disk.

pub mod error;
pub mod fingerprint;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use io::RobustnessConfig;
pub use path::{RemotePath, plaintext_name, source_basename};
