//! Seat reservation entities.

pub mod model;

pub use model::{SeatReservation, SeatState};
