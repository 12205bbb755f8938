//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod queue;
pub mod seat;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use boxoffice_cache::CacheManager;
use boxoffice_core::config::AppConfig;
use boxoffice_core::error::AppError;
use boxoffice_database::DatabasePool;
use boxoffice_queue::AdmissionController;
use boxoffice_realtime::Notifier;

use crate::output::OutputFormat;

/// BoxOffice: seat reservation and waiting-room operations
#[derive(Debug, Parser)]
#[command(name = "boxoffice", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Log verbosity (-v info, -vv debug); `RUST_LOG` takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Seat catalog and schedule status
    Seat(seat::SeatArgs),
    /// Waiting room inspection and priority grants
    Queue(queue::QueueArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config, self.format).await,
            Commands::Seat(args) => seat::execute(args, &self.config, self.format).await,
            Commands::Queue(args) => queue::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_file(config_path)
}

/// Helper: connect to the database named by the configuration
pub async fn connect_db(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: build the waiting-room controller over the configured cache
pub async fn admission_controller(config: &AppConfig) -> Result<Arc<AdmissionController>, AppError> {
    let cache = CacheManager::new(&config.cache).await?;
    let notifier = Notifier::from_config(&config.realtime, &config.cache.redis.url).await?;
    Ok(Arc::new(AdmissionController::new(cache, notifier, &config.queue)))
}
