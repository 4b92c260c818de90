//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, path: &Path, config: &Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            init_config(path, force)?;
            println!("{}", formatter.success(&format!("Configuration written to {}", path.display())));
        }
        ConfigAction::Show => {
            if !path.exists() {
                println!("{}", formatter.info("No configuration file, showing defaults"));
            }
            print!("{}", redacted(config).to_toml()?);
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

/// Write the default configuration, refusing to overwrite unless forced.
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save_to(path)
}

/// Copy of the configuration with the API key masked
fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some("********".to_string());
    }
    shown
}
