//! Reservation store: the durable authority for seat state.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
use boxoffice_entity::reservation::SeatReservation;
use boxoffice_entity::seat::{Seat, SeatStatus};

pub use memory::MemoryReservationStore;
pub use postgres::PostgresReservationStore;

/// Durable, transactional store of the seat catalog and reservations.
///
/// `set_statuses` commits in its own transaction, independent of any
/// workflow the caller is part of, so a committed status stays visible even
/// if that workflow later fails. Undoing it takes a second, compensating
/// `set_statuses` call.
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Look up one catalog seat.
    async fn find_seat(&self, seat_id: SeatId) -> AppResult<Option<Seat>>;

    /// Look up several catalog seats; unknown IDs are skipped.
    async fn find_seats(&self, seat_ids: &[SeatId]) -> AppResult<Vec<Seat>>;

    /// Full catalog of a schedule.
    async fn list_seats(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>>;

    /// Record for a (schedule, seat) pair.
    async fn find_reservation(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<Option<SeatReservation>>;

    /// Record by ID.
    async fn find_reservation_by_id(&self, id: ReservationId)
    -> AppResult<Option<SeatReservation>>;

    /// Record for a pair, created as AVAILABLE on first touch.
    async fn get_or_create_available(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<SeatReservation>;

    /// Every record of a schedule.
    async fn list_reservations(&self, schedule_id: ScheduleId) -> AppResult<Vec<SeatReservation>>;

    /// Records of a schedule with the given status.
    async fn list_by_status(
        &self,
        schedule_id: ScheduleId,
        status: SeatStatus,
    ) -> AppResult<Vec<SeatReservation>>;

    /// Upsert statuses for several seats of one schedule, all or nothing.
    async fn set_statuses(
        &self,
        schedule_id: ScheduleId,
        changes: &[(SeatId, SeatStatus)],
    ) -> AppResult<Vec<SeatReservation>>;

    /// Records in `status` whose last change is older than `before`.
    async fn find_stale(
        &self,
        status: SeatStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<SeatReservation>>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
