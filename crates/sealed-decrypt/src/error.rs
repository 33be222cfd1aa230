//! Error types for decrypt operations

use std::path::PathBuf;

/// Errors that can occur while decrypting a source
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    /// No strategy is configured, or none of the configured tools is installed
    #[error("No decrypt tool available. Install regpg or gpg, or check the [decrypt] tools list.")]
    NoStrategies,

    /// The tool binary could not be found
    #[error("{tool} not found")]
    ToolNotFound {
        /// Name of the strategy whose program was missing
        tool: String,
    },

    /// The tool could not be started for a reason other than being missing
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited non-zero
    #[error("{tool} failed (exit code {code}): {stderr}")]
    CommandFailed {
        tool: String,
        /// Exit code, or -1 when terminated by a signal
        code: i32,
        /// Captured stderr, diagnostic only
        stderr: String,
    },

    /// The tool succeeded but wrote nothing to stdout
    #[error("{tool} decrypt {path} produced no output")]
    NoOutput { tool: String, path: PathBuf },

    /// Every strategy was tried and failed
    #[error("decrypting {path} failed: {last}")]
    Exhausted {
        path: PathBuf,
        #[source]
        last: Box<DecryptError>,
    },
}

/// Result type alias for decrypt operations
pub type Result<T> = std::result::Result<T, DecryptError>;
