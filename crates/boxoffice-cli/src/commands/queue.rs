//! Waiting room commands.

use std::time::Duration;

use clap::{Args, Subcommand};

use boxoffice_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the queue command
#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Queue subcommand
    #[command(subcommand)]
    pub command: QueueCommand,
}

/// Queue subcommands
#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Show enqueue totals, shard range and waiting count
    Stats,
    /// Show whether a token has been admitted
    Status {
        /// Queue token
        token: String,
    },
    /// Let a token skip the queue on its next enqueue
    Grant {
        /// Queue token
        token: String,
        /// How long the grant stays valid, in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_seconds: u64,
    },
    /// Promote one batch from every active shard now
    Tick,
}

/// Execute queue commands
pub async fn execute(
    args: &QueueArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let queue = super::admission_controller(&config).await?;

    match &args.command {
        QueueCommand::Stats => {
            let stats = queue.stats().await?;
            output::print_item(&stats, format);
        }
        QueueCommand::Status { token } => {
            let status = queue.status(token).await?;
            output::print_item(&serde_json::json!({ "token": token, "status": status }), format);
        }
        QueueCommand::Grant { token, ttl_seconds } => {
            queue
                .grant_priority(token, Duration::from_secs(*ttl_seconds))
                .await?;
            output::print_success(&format!("Granted priority to '{token}'"));
        }
        QueueCommand::Tick => {
            let promoted = queue.tick().await?;
            output::print_success(&format!("Promoted {promoted} tokens"));
        }
    }

    Ok(())
}
