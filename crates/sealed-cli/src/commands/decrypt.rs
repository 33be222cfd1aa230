//! Decrypt command: the filter form of the decryptor

use std::io::Write;
use std::path::{Path, PathBuf};

use sealed_core::{SealedConfig, resolve_source};
use sealed_decrypt::SystemRunner;

use super::available_strategies;
use crate::error::Result;

/// Decrypt `src` and write the plaintext to stdout.
///
/// `src` is read as given, without the `files/` lookup `install` does.
///
/// Fails like `install` does on empty output, so nothing is printed for a
/// source that decrypts to zero bytes.
pub fn run_decrypt(
    config: &SealedConfig,
    src: &Path,
    keyring: Option<PathBuf>,
) -> Result<()> {
    let source = resolve_source(None, src)?;
    let strategies = available_strategies(config, keyring)?;
    let decryptor = config.decryptor(strategies, SystemRunner);

    let plaintext = decryptor.decrypt(&source)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(plaintext.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
