//! PostgreSQL-backed reservation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
use boxoffice_database::DatabasePool;
use boxoffice_database::repositories::{ReservationRepository, SeatRepository};
use boxoffice_entity::reservation::SeatReservation;
use boxoffice_entity::seat::{Seat, SeatStatus};

use super::ReservationStore;

/// Reservation store over the seat and reservation repositories.
#[derive(Debug, Clone)]
pub struct PostgresReservationStore {
    db: DatabasePool,
    seats: SeatRepository,
    reservations: ReservationRepository,
}

impl PostgresReservationStore {
    /// Create a store over a connected pool.
    pub fn new(db: DatabasePool) -> Self {
        Self {
            seats: db.seats(),
            reservations: db.reservations(),
            db,
        }
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn find_seat(&self, seat_id: SeatId) -> AppResult<Option<Seat>> {
        self.seats.find_by_id(seat_id).await
    }

    async fn find_seats(&self, seat_ids: &[SeatId]) -> AppResult<Vec<Seat>> {
        self.seats.find_by_ids(seat_ids).await
    }

    async fn list_seats(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>> {
        self.seats.find_by_schedule(schedule_id).await
    }

    async fn find_reservation(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<Option<SeatReservation>> {
        self.reservations.find(schedule_id, seat_id).await
    }

    async fn find_reservation_by_id(
        &self,
        id: ReservationId,
    ) -> AppResult<Option<SeatReservation>> {
        self.reservations.find_by_id(id).await
    }

    async fn get_or_create_available(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<SeatReservation> {
        self.reservations
            .get_or_create_available(schedule_id, seat_id)
            .await
    }

    async fn list_reservations(&self, schedule_id: ScheduleId) -> AppResult<Vec<SeatReservation>> {
        self.reservations.find_by_schedule(schedule_id).await
    }

    async fn list_by_status(
        &self,
        schedule_id: ScheduleId,
        status: SeatStatus,
    ) -> AppResult<Vec<SeatReservation>> {
        self.reservations.find_by_status(schedule_id, status).await
    }

    async fn set_statuses(
        &self,
        schedule_id: ScheduleId,
        changes: &[(SeatId, SeatStatus)],
    ) -> AppResult<Vec<SeatReservation>> {
        self.reservations.set_statuses(schedule_id, changes).await
    }

    async fn find_stale(
        &self,
        status: SeatStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<SeatReservation>> {
        self.reservations.find_stale(status, before).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
