//! Command implementations for sealed-cli

pub mod decrypt;
pub mod install;
pub mod tools;

use std::path::{Path, PathBuf};

use sealed_core::SealedConfig;
use sealed_decrypt::{Capabilities, Strategy};

use crate::error::Result;

pub use decrypt::run_decrypt;
pub use install::run_install;
pub use tools::run_tools;

/// Load `--config` if given, else `sealed.toml` from `cwd` if present.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<SealedConfig> {
    let config = match explicit {
        Some(path) => SealedConfig::load(path)?,
        None => SealedConfig::discover(cwd)?,
    };
    Ok(config)
}

/// Configured strategies, with the keyring overridden if given, narrowed to
/// the tools installed on this host.
pub fn available_strategies(
    config: &SealedConfig,
    keyring: Option<PathBuf>,
) -> Result<Vec<Strategy>> {
    let mut strategies = config.strategies()?;
    if keyring.is_some() {
        strategies = strategies
            .into_iter()
            .map(|s| s.with_keyring(keyring.clone()))
            .collect();
    }

    let capabilities = Capabilities::detect(&strategies);
    let available = capabilities.filter(strategies);
    tracing::debug!(
        available = ?available.iter().map(Strategy::name).collect::<Vec<_>>(),
        "Detected decrypt tools"
    );
    Ok(available)
}
