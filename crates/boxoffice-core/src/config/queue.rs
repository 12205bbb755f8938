//! Queue admission controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Waiting room configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Key namespace for every queue key (`{namespace}:group:{n}` ...).
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Maximum number of tokens assigned to one shard.
    #[serde(default = "default_shard_capacity")]
    pub shard_capacity: u64,
    /// Maximum number of tokens promoted per shard per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Admission loop interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Lifetime of a ready flag.
    #[serde(default = "default_ready_ttl")]
    pub ready_ttl_seconds: u64,
    /// Admitted population at or below which tokens skip the queue.
    #[serde(default = "default_fast_path_threshold")]
    pub fast_path_threshold: i64,
    /// Lifetime of a per-shard lock.
    #[serde(default = "default_shard_lock_ttl")]
    pub shard_lock_ttl_seconds: u64,
}

impl QueueConfig {
    /// Admission loop interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Ready flag TTL as a [`Duration`].
    pub fn ready_ttl(&self) -> Duration {
        Duration::from_secs(self.ready_ttl_seconds)
    }

    /// Shard lock TTL as a [`Duration`].
    pub fn shard_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.shard_lock_ttl_seconds)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            shard_capacity: default_shard_capacity(),
            batch_size: default_batch_size(),
            interval_ms: default_interval_ms(),
            ready_ttl_seconds: default_ready_ttl(),
            fast_path_threshold: default_fast_path_threshold(),
            shard_lock_ttl_seconds: default_shard_lock_ttl(),
        }
    }
}

fn default_namespace() -> String {
    "queue".to_string()
}

fn default_shard_capacity() -> u64 {
    120
}

fn default_batch_size() -> usize {
    120
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_ready_ttl() -> u64 {
    600
}

fn default_fast_path_threshold() -> i64 {
    1000
}

fn default_shard_lock_ttl() -> u64 {
    5
}
