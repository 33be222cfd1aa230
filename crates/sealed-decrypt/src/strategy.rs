//! Decrypt tool strategies
//!
//! A strategy names a tool and knows how to build its argument vector.
//! Strategies are tried in order by the [`Decryptor`](crate::Decryptor).

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The argument conventions a strategy follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// `regpg decrypt [-k <keyring>] <file> -`
    Regpg,
    /// `gpg --use-agent --batch --quiet --decrypt <file>`
    Gpg,
}

impl ToolKind {
    /// Default program name for this kind.
    pub fn program(&self) -> &'static str {
        match self {
            ToolKind::Regpg => "regpg",
            ToolKind::Gpg => "gpg",
        }
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regpg" => Ok(ToolKind::Regpg),
            "gpg" | "gpg2" => Ok(ToolKind::Gpg),
            other => Err(format!("unknown decrypt tool '{}' (expected regpg or gpg)", other)),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// One way of invoking a decrypt tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    kind: ToolKind,
    program: PathBuf,
    keyring: Option<PathBuf>,
}

impl Strategy {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            program: PathBuf::from(kind.program()),
            keyring: None,
        }
    }

    pub fn regpg(keyring: Option<PathBuf>) -> Self {
        Self {
            keyring,
            ..Self::new(ToolKind::Regpg)
        }
    }

    pub fn gpg() -> Self {
        Self::new(ToolKind::Gpg)
    }

    /// Use an explicit program path instead of the default name.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Keyring passed to regpg as `-k`. Ignored by gpg, which uses the agent.
    pub fn with_keyring(mut self, keyring: Option<PathBuf>) -> Self {
        self.keyring = keyring;
        self
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Human-readable name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        self.kind.program()
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the argument vector (without the program) for decrypting `source`.
    ///
    /// Every variant is non-interactive: output goes to stdout, nothing
    /// prompts for a passphrase.
    pub fn argv(&self, source: &Path) -> Vec<OsString> {
        match self.kind {
            ToolKind::Regpg => {
                let mut args = vec![OsString::from("decrypt")];
                if let Some(keyring) = &self.keyring {
                    args.push("-k".into());
                    args.push(keyring.clone().into_os_string());
                }
                args.push(source.as_os_str().to_os_string());
                args.push("-".into());
                args
            }
            ToolKind::Gpg => vec![
                "--use-agent".into(),
                "--batch".into(),
                "--quiet".into(),
                "--decrypt".into(),
                source.as_os_str().to_os_string(),
            ],
        }
    }
}

/// The default preference order: regpg first, plain gpg as fallback.
pub fn default_strategies(keyring: Option<PathBuf>) -> Vec<Strategy> {
    vec![Strategy::regpg(keyring), Strategy::gpg()]
}
