//! Waiting-room domain events.

use serde::{Deserialize, Serialize};

/// Events related to queue admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// A waiting token was promoted and may enter the seat pages.
    Admitted {
        /// The admitted token.
        token: String,
        /// Shard the token was waiting in; `None` for fast-path admission.
        shard: Option<u64>,
    },
}
