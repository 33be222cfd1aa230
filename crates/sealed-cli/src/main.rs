//! sealed CLI
//!
//! Decrypts secrets and installs them only when the destination differs.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;
    tracing::debug!("Verbose mode enabled");

    let cwd = std::env::current_dir()?;
    let config = commands::load_config(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Install(args) => commands::run_install(&cwd, &config, args),
        Commands::Decrypt { src, keyring } => {
            commands::run_decrypt(&config, &src, keyring).map(|()| 0)
        }
        Commands::Tools { json } => commands::run_tools(&config, json).map(|()| 0),
    }
}
