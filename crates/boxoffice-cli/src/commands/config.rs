//! Configuration inspection.

use clap::{Args, Subcommand};

use boxoffice_core::error::AppError;
use boxoffice_database::redact_url;

use crate::output::{self, OutputFormat};

/// Arguments for the config command
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file plus environment overrides)
    Show,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            config.database.url = redact_url(&config.database.url);
            config.cache.redis.url = redact_url(&config.cache.redis.url);
            output::print_item(&config, format);
        }
    }
    Ok(())
}
