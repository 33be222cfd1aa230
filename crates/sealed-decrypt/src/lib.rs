//! Decryption for sealed
//!
//! This crate invokes external decryption tooling on an encrypted source
//! and validates what comes back. It handles:
//!
//! - An ordered list of decrypt tool strategies (regpg, gpg)
//! - Bounded retries per strategy, then fallback to the next one
//! - Rejection of empty output, which is never a valid secret
//! - Detection of which tools are installed, once, up front
//!
//! Decrypted bytes are held in [`Plaintext`], which wipes its buffer on drop.

pub mod decryptor;
pub mod discovery;
pub mod error;
pub mod plaintext;
pub mod runner;
pub mod strategy;

pub use decryptor::{DEFAULT_ATTEMPTS, Decryptor};
pub use discovery::{Capabilities, ToolStatus};
pub use error::{DecryptError, Result};
pub use plaintext::Plaintext;
pub use runner::{SystemRunner, ToolOutput, ToolRunner};
pub use strategy::{Strategy, ToolKind, default_strategies};
