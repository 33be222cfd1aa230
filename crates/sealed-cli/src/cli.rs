//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// sealed - Install encrypted secrets only when they change
#[derive(Parser, Debug)]
#[command(name = "sealed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./sealed.toml when present)
    #[arg(long, global = true, env = "SEALED_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Decrypt a source and install it at a destination if it differs
    ///
    /// A destination ending in `/` is a directory: the file is placed
    /// inside it, named after the source without its .gpg/.asc suffix.
    ///
    /// Examples:
    ///   sealed install secret.gpg /etc/app/
    ///   sealed install secret.gpg /etc/app/token --mode 0600
    ///   sealed install secret.gpg /etc/app/ --check --json
    Install(InstallArgs),

    /// Decrypt a source and print the plaintext to stdout
    Decrypt {
        /// Encrypted source file
        src: PathBuf,

        /// Keyring passed to regpg
        #[arg(short, long)]
        keyring: Option<PathBuf>,
    },

    /// Show which decrypt tools are available
    Tools {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InstallArgs {
    /// Encrypted source, relative to the base directory's files/ or itself
    pub src: PathBuf,

    /// Destination path; a trailing `/` means "inside this directory"
    pub dest: String,

    /// Leave an existing destination with different content alone
    #[arg(long)]
    pub no_force: bool,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,

    /// Octal permissions for the installed file (e.g. 0600)
    #[arg(long)]
    pub mode: Option<String>,

    /// Numeric owner id for the installed file
    #[arg(long)]
    pub owner: Option<u32>,

    /// Numeric group id for the installed file
    #[arg(long)]
    pub group: Option<u32>,

    /// Not supported; rejected with a usage error
    #[arg(long, hide = true)]
    pub state: Option<String>,

    /// Existing staging directory to reuse instead of creating one
    #[arg(long, value_name = "DIR")]
    pub staging: Option<String>,

    /// Directory relative sources are resolved from
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Keyring passed to regpg
    #[arg(short, long)]
    pub keyring: Option<PathBuf>,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}
