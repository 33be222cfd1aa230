//! Tool discovery: find which decrypt tools are installed
//!
//! Capability detection runs once at startup. The rest of the flow then
//! dispatches on the detected set instead of probing the environment again.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::strategy::Strategy;

/// Availability of one strategy's program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    /// Strategy name (e.g. "regpg")
    pub name: String,
    /// Program as configured
    pub program: PathBuf,
    /// Resolved executable, if found
    pub resolved: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// The set of decrypt tools found on this host
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    tools: Vec<ToolStatus>,
}

impl Capabilities {
    /// Detect tools using the process `PATH`.
    pub fn detect(strategies: &[Strategy]) -> Self {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::detect_in(strategies, &search_path)
    }

    /// Detect tools against an explicit search path.
    pub fn detect_in(strategies: &[Strategy], search_path: &OsStr) -> Self {
        let tools = strategies
            .iter()
            .map(|strategy| {
                let resolved = find_executable(strategy.program(), search_path);
                match &resolved {
                    Some(path) => {
                        tracing::debug!(tool = strategy.name(), path = %path.display(), "Decrypt tool found")
                    }
                    None => tracing::debug!(tool = strategy.name(), "Decrypt tool not found"),
                }
                ToolStatus {
                    name: strategy.name().to_string(),
                    program: strategy.program().to_path_buf(),
                    resolved,
                }
            })
            .collect();
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolStatus] {
        &self.tools
    }

    /// Whether any configured tool is installed
    pub fn any_available(&self) -> bool {
        self.tools.iter().any(ToolStatus::is_available)
    }

    /// Keep only strategies whose program was found, preserving order.
    ///
    /// Kept strategies are pinned to the resolved executable.
    pub fn filter(&self, strategies: Vec<Strategy>) -> Vec<Strategy> {
        strategies
            .into_iter()
            .filter_map(|strategy| {
                let status = self
                    .tools
                    .iter()
                    .find(|t| t.program.as_path() == strategy.program())?;
                let resolved = status.resolved.clone()?;
                Some(strategy.with_program(resolved))
            })
            .collect()
    }
}

/// Search for an executable by name or path.
///
/// Programs containing a path separator are checked directly; bare names
/// are looked up in each directory of `search_path`.
fn find_executable(program: &Path, search_path: &OsStr) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }

    std::env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
