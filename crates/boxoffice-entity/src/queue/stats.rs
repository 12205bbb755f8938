//! Queue statistics snapshot.

use serde::{Deserialize, Serialize};

/// Point-in-time view of the waiting room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tokens ever assigned to a shard.
    pub enqueued_total: u64,
    /// Admitted tokens whose ready flag has not yet expired.
    pub admitted_live: u64,
    /// Oldest shard still being drained.
    pub head_shard: u64,
    /// Newest shard receiving tokens.
    pub tail_shard: u64,
    /// Tokens currently waiting across active shards.
    pub waiting: u64,
}
