//! Tools command: report decrypt tool detection

use colored::Colorize;

use sealed_core::SealedConfig;
use sealed_decrypt::Capabilities;

use crate::error::Result;

/// Print which configured decrypt tools were found, in preference order.
pub fn run_tools(config: &SealedConfig, json: bool) -> Result<()> {
    let strategies = config.strategies()?;
    let capabilities = Capabilities::detect(&strategies);

    if json {
        println!("{}", serde_json::to_string_pretty(capabilities.tools())?);
        return Ok(());
    }

    println!("{} Decrypt tools (in preference order):", "=>".blue().bold());
    for tool in capabilities.tools() {
        match &tool.resolved {
            Some(path) => println!(
                "   {} {} {}",
                "+".green(),
                tool.name.cyan(),
                path.display().to_string().dimmed()
            ),
            None => println!("   {} {} {}", "-".red(), tool.name.cyan(), "not found".dimmed()),
        }
    }

    if !capabilities.any_available() {
        println!();
        println!(
            "{} No decrypt tool is installed; install regpg or gpg.",
            "WARNING".yellow().bold()
        );
    }
    Ok(())
}
