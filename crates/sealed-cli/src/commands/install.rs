//! Install command implementation

use std::path::Path;

use colored::Colorize;

use sealed_core::config::parse_mode;
use sealed_core::{
    Error, FileAttributes, LocalInstaller, LocalTransport, SealedConfig, SyncEngine, SyncOptions,
    SyncRequest, SyncResult, resolve_source,
};
use sealed_decrypt::{DecryptError, SystemRunner};

use super::available_strategies;
use crate::cli::InstallArgs;
use crate::error::Result;

/// Exit status for a run that reached a failed terminal state
pub const EXIT_SYNC_FAILED: i32 = 2;

/// Run the install command, returning the process exit status.
pub fn run_install(cwd: &Path, config: &SealedConfig, args: InstallArgs) -> Result<i32> {
    let attributes = merge_attributes(config.attributes()?, &args)?;
    let strategies = available_strategies(config, args.keyring.clone())?;

    let base_dir = args.base.clone().unwrap_or_else(|| cwd.to_path_buf());
    let mut request = SyncRequest::new(&args.src, args.dest.as_str())
        .with_force(!args.no_force)
        .with_attributes(attributes);
    if let Some(state) = &args.state {
        request = request.with_state(state.as_str());
    }
    if let Some(staging) = &args.staging {
        request = request.with_staging(staging.as_str());
    }

    // Usage and source errors outrank a host with no decrypt tools
    let preflight = request
        .validate()
        .and_then(|()| resolve_source(Some(base_dir.as_path()), &request.source));

    let result = match preflight {
        Err(e) => SyncResult::failed(&e),
        Ok(_) if strategies.is_empty() => {
            SyncResult::failed(&Error::from(DecryptError::NoStrategies))
        }
        Ok(_) => {
            let mut transport = LocalTransport::new();
            if let Some(root) = &config.staging.root {
                transport = transport.with_staging_root(root);
            }
            SyncEngine::new(
                transport,
                LocalInstaller::new(),
                config.decryptor(strategies, SystemRunner),
            )
            .with_options(SyncOptions {
                check_mode: args.check,
                base_dir: Some(base_dir),
            })
            .sync(&request)
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(if result.failed { EXIT_SYNC_FAILED } else { 0 })
}

/// Command-line attributes override the configured ones field by field.
fn merge_attributes(configured: FileAttributes, args: &InstallArgs) -> Result<FileAttributes> {
    Ok(FileAttributes {
        mode: match &args.mode {
            Some(mode) => Some(parse_mode(mode)?),
            None => configured.mode,
        },
        owner: args.owner.or(configured.owner),
        group: args.group.or(configured.group),
    })
}

fn print_result(result: &SyncResult) {
    let dest = result.dest.as_deref().unwrap_or("-");

    if result.failed {
        println!(
            "{} {}",
            "FAILED".red().bold(),
            result.message.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    let status = match (result.changed, result.check_mode) {
        (true, true) => "WOULD CHANGE".yellow().bold(),
        (true, false) => "CHANGED".yellow().bold(),
        (false, _) => "OK".green().bold(),
    };
    println!("{} {}", status, dest.cyan());

    if let (Some(before), Some(after)) = (result.before(), result.after()) {
        if result.changed {
            println!("   {} {}", "before:".dimmed(), before);
            println!("   {} {}", "after: ".dimmed(), after);
        }
    }
    if result.metadata_changed {
        println!("   {} permissions/ownership updated", "~".blue());
    }
    if let Some(message) = &result.message {
        println!("   {}", message.dimmed());
    }
    for warning in &result.warnings {
        println!("   {} {}", "warning:".yellow(), warning);
    }
}
