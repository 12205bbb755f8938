//! Seat reservation engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Seat reservation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Lifetime of a soft seat hold in the lease cache.
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_seconds: u64,
    /// Lifetime of a per-seat lock.
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
    /// Reservation store backend: `"memory"` or `"postgres"`.
    #[serde(default = "default_store")]
    pub store: String,
    /// Seat catalog loaded into the in-memory store at startup.
    #[serde(default)]
    pub seed: Vec<SeatLayout>,
}

/// A block of seats for one schedule: every row gets seats numbered
/// `1..=seats_per_row`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLayout {
    pub schedule_id: i64,
    #[serde(default = "default_section")]
    pub section: String,
    /// Row labels in display order.
    pub rows: Vec<String>,
    pub seats_per_row: i32,
}

impl ReservationConfig {
    /// Hold TTL as a [`Duration`].
    pub fn hold_ttl(&self) -> Duration {
        Duration::from_secs(self.hold_ttl_seconds)
    }

    /// Lock TTL as a [`Duration`].
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: default_hold_ttl(),
            lock_ttl_seconds: default_lock_ttl(),
            store: default_store(),
            seed: Vec::new(),
        }
    }
}

fn default_hold_ttl() -> u64 {
    300
}

fn default_lock_ttl() -> u64 {
    300
}

fn default_store() -> String {
    "memory".to_string()
}

fn default_section() -> String {
    "MAIN".to_string()
}
