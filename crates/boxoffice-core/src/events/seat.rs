//! Seat-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{ScheduleId, SeatId};

/// Events related to seat state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SeatEvent {
    /// A seat's reservation status was committed to cache and store.
    StatusChanged {
        /// The schedule the seat belongs to.
        schedule_id: ScheduleId,
        /// The seat.
        seat_id: SeatId,
        /// New status in wire form (`"RESERVED"`, `"COMPLETED"`, ...).
        status: String,
    },
    /// An abandoned hold was returned to the pool by the reaper.
    HoldExpired {
        /// The schedule the seat belongs to.
        schedule_id: ScheduleId,
        /// The seat.
        seat_id: SeatId,
    },
}
