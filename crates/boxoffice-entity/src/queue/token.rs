//! Queue token value type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a token may proceed to the seat pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    /// The token holds a live ready flag.
    Ready,
    /// The token is still waiting (or unknown).
    Waiting,
}

impl AdmissionStatus {
    /// Build from a ready flag.
    pub fn from_ready(ready: bool) -> Self {
        if ready { Self::Ready } else { Self::Waiting }
    }
}

/// Ticket handed back to a visitor after enqueueing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueToken {
    /// Opaque visitor token.
    pub token: String,
    /// When the visitor arrived.
    pub enqueued_at: DateTime<Utc>,
    /// Shard the token waits in; `None` when admitted on arrival.
    pub shard: Option<u64>,
    /// Admission status at the time the ticket was issued.
    pub status: AdmissionStatus,
}

impl QueueToken {
    /// Ticket for a token admitted without waiting.
    pub fn ready(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            enqueued_at: Utc::now(),
            shard: None,
            status: AdmissionStatus::Ready,
        }
    }

    /// Ticket for a token placed in `shard`.
    pub fn waiting(token: impl Into<String>, shard: u64) -> Self {
        Self {
            token: token.into(),
            enqueued_at: Utc::now(),
            shard: Some(shard),
            status: AdmissionStatus::Waiting,
        }
    }

    /// Whether the ticket was issued as ready.
    pub fn is_ready(&self) -> bool {
        self.status == AdmissionStatus::Ready
    }
}
