//! Seat reservation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};

use crate::seat::SeatStatus;

/// The durable record for one (schedule, seat) pair. At most one record
/// exists per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SeatReservation {
    /// Unique reservation ID.
    pub id: ReservationId,
    /// The schedule.
    pub schedule_id: ScheduleId,
    /// The seat.
    pub seat_id: SeatId,
    /// Current status.
    pub status: SeatStatus,
    /// When the record was first touched.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl SeatReservation {
    /// Project the record onto its client-facing state.
    pub fn state(&self) -> SeatState {
        SeatState {
            seat_id: self.seat_id,
            status: self.status,
        }
    }
}

/// `{seat_id, status}` pair returned to callers of the reservation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatState {
    /// The seat.
    pub seat_id: SeatId,
    /// Its status.
    pub status: SeatStatus,
}

impl SeatState {
    /// Create a seat state.
    pub fn new(seat_id: SeatId, status: SeatStatus) -> Self {
        Self { seat_id, status }
    }
}
