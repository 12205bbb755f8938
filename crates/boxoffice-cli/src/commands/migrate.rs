//! Database migration management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use boxoffice_core::error::{AppError, ErrorKind};

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show applied migrations
    Status,
}

#[derive(Debug, Serialize, Tabled, sqlx::FromRow)]
struct AppliedMigration {
    #[tabled(rename = "Version")]
    version: i64,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Success")]
    success: bool,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let db = super::connect_db(&config).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            db.migrate().await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let applied = sqlx::query_as::<_, AppliedMigration>(
                "SELECT version, description, success FROM _sqlx_migrations ORDER BY version",
            )
            .fetch_all(db.pool())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read migration table", e)
            })?;
            output::print_list(&applied, format);
        }
    }

    db.close().await;
    Ok(())
}
