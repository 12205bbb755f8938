//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker and scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether background tasks (admission ticker, reaper, cron) run.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of worker tasks in the request pool.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Bounded queue capacity in front of the pool.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Interval in seconds between hold reaper sweeps.
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
    /// Cron expression for the daily queue statistics job.
    #[serde(default = "default_stats_cron")]
    pub stats_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            reaper_interval_seconds: default_reaper_interval(),
            stats_cron: default_stats_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    16
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_reaper_interval() -> u64 {
    60
}

fn default_stats_cron() -> String {
    "0 0 0 * * *".to_string()
}
