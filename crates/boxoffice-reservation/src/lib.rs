//! # boxoffice-reservation
//!
//! Seat reservation engine for BoxOffice. Seats are soft-held in the lease
//! cache and recorded in the reservation store; per-seat locks make every
//! state change race-free.
//!
//! - [`SeatReservationEngine`]: select one seat, auto-assign a contiguous
//!   block, read a schedule's status, apply payment outcomes
//! - [`ReservationStore`]: durable store abstraction with in-memory and
//!   PostgreSQL implementations
//! - [`HoldReaper`]: returns abandoned holds to the pool

pub mod contiguity;
pub mod engine;
pub mod outcome;
pub mod reaper;
pub mod store;

pub use engine::SeatReservationEngine;
pub use outcome::{
    CapacityShortfall, ConflictReason, MissingRecord, ReservationOutcome, SeatConflict,
};
pub use reaper::HoldReaper;
pub use store::{MemoryReservationStore, PostgresReservationStore, ReservationStore};
