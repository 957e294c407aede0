//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// Prints the effective configuration with the API key masked. With
/// `--save`, writes it to `path` first; the key itself is never written.
pub fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    if args.save {
        let mut stored = config.clone();
        stored.model.api_key = None;
        stored.save_to(path)?;
        println!("{}", formatter.success(&format!("Configuration saved to {}", path.display())));
    }

    let text = toml::to_string_pretty(&config.masked())
        .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
    println!("# {}", path.display());
    println!("{}", text);

    Ok(())
}
