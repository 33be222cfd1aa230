//! Configuration file parsing
//!
//! A `sealed.toml` holds defaults for decryption, staging and the
//! permission fixup. Every section is optional; an empty file is valid.
//!
//! ```toml
//! [decrypt]
//! attempts = 3
//! keyring = "pubring.gpg"
//! tools = ["regpg", "gpg"]
//!
//! [staging]
//! root = "/var/tmp"
//!
//! [install]
//! mode = "0600"
//! owner = 0
//! group = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sealed_decrypt::{DEFAULT_ATTEMPTS, Decryptor, Strategy, ToolKind, ToolRunner};

use crate::error::{Error, Result};
use crate::install::FileAttributes;

/// Configuration file name looked up in the working directory
pub const FILE_NAME: &str = "sealed.toml";

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

fn default_tools() -> Vec<String> {
    vec!["regpg".to_string(), "gpg".to_string()]
}

/// `[decrypt]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptConfig {
    /// Attempts per tool before falling back
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Keyring passed to regpg
    #[serde(default)]
    pub keyring: Option<PathBuf>,

    /// Tool preference order
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,

    /// Pause between attempts of the same tool
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            keyring: None,
            tools: default_tools(),
            retry_delay_ms: 0,
        }
    }
}

/// `[staging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Parent of per-run staging directories; the system temp dir if unset
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// `[install]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Octal permission string such as `"0600"`
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<u32>,
    #[serde(default)]
    pub group: Option<u32>,
}

/// Parsed `sealed.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedConfig {
    #[serde(default)]
    pub decrypt: DecryptConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub install: InstallConfig,
}

impl SealedConfig {
    /// Parse configuration from TOML content.
    ///
    /// ```
    /// use sealed_core::config::SealedConfig;
    ///
    /// let config = SealedConfig::parse(r#"
    /// [decrypt]
    /// tools = ["gpg"]
    /// "#).unwrap();
    ///
    /// assert_eq!(config.decrypt.attempts, 3);
    /// assert_eq!(config.decrypt.tools, vec!["gpg"]);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: SealedConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            Error::TomlDe(source) => Error::InvalidConfig {
                path: path.to_path_buf(),
                message: source.message().to_string(),
            },
            other => other,
        })
    }

    /// Load `sealed.toml` from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Decrypt strategies in configured preference order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] for an unknown tool name.
    pub fn strategies(&self) -> Result<Vec<Strategy>> {
        self.decrypt
            .tools
            .iter()
            .map(|name| {
                let kind: ToolKind = name.parse().map_err(Error::usage)?;
                Ok(Strategy::new(kind).with_keyring(self.decrypt.keyring.clone()))
            })
            .collect()
    }

    /// Permission fixup from the `[install]` section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if `mode` is not an octal permission.
    pub fn attributes(&self) -> Result<FileAttributes> {
        Ok(FileAttributes {
            mode: self.install.mode.as_deref().map(parse_mode).transpose()?,
            owner: self.install.owner,
            group: self.install.group,
        })
    }

    /// A decryptor for the given strategies with the configured retry policy.
    pub fn decryptor(&self, strategies: Vec<Strategy>, runner: impl ToolRunner + 'static) -> Decryptor {
        Decryptor::new(strategies, runner)
            .with_attempts(self.decrypt.attempts)
            .with_retry_delay(Duration::from_millis(self.decrypt.retry_delay_ms))
    }
}

/// Parse an octal permission string such as `"0640"` or `"600"`.
pub fn parse_mode(value: &str) -> Result<u32> {
    let digits = value.trim();
    let digits = digits.strip_prefix("0o").unwrap_or(digits);
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if !digits.is_empty() && mode <= 0o7777 => Ok(mode),
        _ => Err(Error::usage(format!(
            "invalid mode '{}': expected an octal permission like 0640",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SealedConfig::parse("").unwrap();
        assert_eq!(config, SealedConfig::default());
        assert_eq!(config.decrypt.attempts, 3);
        assert_eq!(config.decrypt.tools, vec!["regpg", "gpg"]);
        assert!(config.attributes().unwrap().is_empty());
    }

    #[test]
    fn full_file() {
        let config = SealedConfig::parse(
            r#"
            [decrypt]
            attempts = 5
            keyring = "pubring.gpg"
            tools = ["gpg", "regpg"]

            [staging]
            root = "/var/tmp"

            [install]
            mode = "0640"
            owner = 0
            group = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.staging.root, Some(PathBuf::from("/var/tmp")));
        assert_eq!(
            config.attributes().unwrap(),
            FileAttributes {
                mode: Some(0o640),
                owner: Some(0),
                group: Some(42),
            }
        );
        let strategies = config.strategies().unwrap();
        assert_eq!(strategies[0].kind(), ToolKind::Gpg);
        assert_eq!(strategies[1].kind(), ToolKind::Regpg);
    }

    #[test]
    fn unknown_tool_is_usage_error() {
        let config = SealedConfig::parse("[decrypt]\ntools = [\"age\"]").unwrap();
        let err = config.strategies().unwrap_err();
        assert!(matches!(err, Error::Usage { .. }));
        assert!(err.to_string().contains("age"));
    }

    #[rstest]
    #[case("0600", Some(0o600))]
    #[case("640", Some(0o640))]
    #[case("0o755", Some(0o755))]
    #[case("4755", Some(0o4755))]
    #[case("0999", None)]
    #[case("rw-r--r--", None)]
    #[case("", None)]
    #[case("17777", None)]
    fn modes(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_mode(input).ok(), expected);
    }

    #[test]
    fn malformed_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(FILE_NAME);
        std::fs::write(&path, "[decrypt\nattempts = ").unwrap();

        let err = SealedConfig::discover(temp.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(err.to_string().contains(FILE_NAME));
    }

    #[test]
    fn discover_without_file_is_default() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            SealedConfig::discover(temp.path()).unwrap(),
            SealedConfig::default()
        );
    }
}
