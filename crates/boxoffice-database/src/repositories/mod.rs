//! Repository implementations for BoxOffice entities.

pub mod reservation;
pub mod seat;

pub use reservation::ReservationRepository;
pub use seat::{NewSeat, SeatRepository};
