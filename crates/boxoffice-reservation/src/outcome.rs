//! Explicit outcomes of reservation requests.
//!
//! A seat that is already taken or a block that does not fit are normal
//! answers, not failures. They are returned as variants so callers match
//! exhaustively; `Err(AppError)` is left for cache and store failures.

use serde::{Deserialize, Serialize};

use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};

/// Result of a reservation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ReservationOutcome<T> {
    /// The change was committed to cache and store.
    Success(T),
    /// The seat is taken or its lock is held; safe to retry.
    Conflict(SeatConflict),
    /// Not enough free seats for the requested block.
    Capacity(CapacityShortfall),
    /// The referenced seat or reservation does not exist.
    NotFound(MissingRecord),
}

impl<T> ReservationOutcome<T> {
    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the request ended in a conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// The committed value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the committed value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReservationOutcome<U> {
        match self {
            Self::Success(value) => ReservationOutcome::Success(f(value)),
            Self::Conflict(c) => ReservationOutcome::Conflict(c),
            Self::Capacity(c) => ReservationOutcome::Capacity(c),
            Self::NotFound(m) => ReservationOutcome::NotFound(m),
        }
    }
}

/// Why a seat could not be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// The seat is already held or sold.
    AlreadyReserved,
    /// Another request holds the seat's lock right now.
    LockBusy,
}

/// Context for a conflict, enough for an idempotent retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConflict {
    /// The schedule.
    pub schedule_id: ScheduleId,
    /// The contended seat.
    pub seat_id: SeatId,
    /// What happened.
    pub reason: ConflictReason,
}

impl SeatConflict {
    /// The seat is already taken.
    pub fn reserved(schedule_id: ScheduleId, seat_id: SeatId) -> Self {
        Self {
            schedule_id,
            seat_id,
            reason: ConflictReason::AlreadyReserved,
        }
    }

    /// The seat's lock is busy.
    pub fn busy(schedule_id: ScheduleId, seat_id: SeatId) -> Self {
        Self {
            schedule_id,
            seat_id,
            reason: ConflictReason::LockBusy,
        }
    }
}

/// Context for a capacity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityShortfall {
    /// The schedule.
    pub schedule_id: ScheduleId,
    /// Seats asked for.
    pub requested: usize,
    /// Seats free when the request was evaluated.
    pub available: usize,
}

/// The record a request referred to but which does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingRecord {
    /// No such seat in the schedule's catalog.
    Seat {
        /// The schedule.
        schedule_id: ScheduleId,
        /// The seat.
        seat_id: SeatId,
    },
    /// No reservation with this ID.
    Reservation {
        /// The reservation.
        reservation_id: ReservationId,
    },
}
