//! Seat reservation repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
use boxoffice_entity::reservation::SeatReservation;
use boxoffice_entity::seat::SeatStatus;

/// Repository for (schedule, seat) reservation records.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Create a new reservation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a (schedule, seat) pair.
    pub async fn find(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<Option<SeatReservation>> {
        sqlx::query_as::<_, SeatReservation>(
            "SELECT * FROM seat_reservations WHERE schedule_id = $1 AND seat_id = $2",
        )
        .bind(schedule_id)
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find reservation", e))
    }

    /// Find a record by ID.
    pub async fn find_by_id(&self, id: ReservationId) -> AppResult<Option<SeatReservation>> {
        sqlx::query_as::<_, SeatReservation>("SELECT * FROM seat_reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find reservation", e)
            })
    }

    /// Return the record for a pair, creating it as AVAILABLE when absent.
    ///
    /// The no-op update makes `RETURNING` yield the existing row on conflict.
    pub async fn get_or_create_available(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<SeatReservation> {
        sqlx::query_as::<_, SeatReservation>(
            "INSERT INTO seat_reservations (schedule_id, seat_id, status) VALUES ($1, $2, 'AVAILABLE') \
             ON CONFLICT (schedule_id, seat_id) DO UPDATE SET schedule_id = EXCLUDED.schedule_id \
             RETURNING *",
        )
        .bind(schedule_id)
        .bind(seat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create reservation", e)
        })
    }

    /// List every record of a schedule.
    pub async fn find_by_schedule(&self, schedule_id: ScheduleId) -> AppResult<Vec<SeatReservation>> {
        sqlx::query_as::<_, SeatReservation>(
            "SELECT * FROM seat_reservations WHERE schedule_id = $1 ORDER BY seat_id",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list reservations", e))
    }

    /// List the records of a schedule with the given status.
    pub async fn find_by_status(
        &self,
        schedule_id: ScheduleId,
        status: SeatStatus,
    ) -> AppResult<Vec<SeatReservation>> {
        sqlx::query_as::<_, SeatReservation>(
            "SELECT * FROM seat_reservations WHERE schedule_id = $1 AND status = $2 ORDER BY seat_id",
        )
        .bind(schedule_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list reservations by status", e)
        })
    }

    /// Upsert the status of several seats of one schedule in a single,
    /// self-contained transaction.
    pub async fn set_statuses(
        &self,
        schedule_id: ScheduleId,
        changes: &[(SeatId, SeatStatus)],
    ) -> AppResult<Vec<SeatReservation>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut updated = Vec::with_capacity(changes.len());
        for (seat_id, status) in changes {
            let row = sqlx::query_as::<_, SeatReservation>(
                "INSERT INTO seat_reservations (schedule_id, seat_id, status) VALUES ($1, $2, $3) \
                 ON CONFLICT (schedule_id, seat_id) DO UPDATE \
                 SET status = EXCLUDED.status, updated_at = NOW() \
                 RETURNING *",
            )
            .bind(schedule_id)
            .bind(*seat_id)
            .bind(*status)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update seat status", e)
            })?;
            updated.push(row);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit seat status", e)
        })?;
        Ok(updated)
    }

    /// Records across all schedules in `status` not updated since `before`.
    pub async fn find_stale(
        &self,
        status: SeatStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<SeatReservation>> {
        sqlx::query_as::<_, SeatReservation>(
            "SELECT * FROM seat_reservations WHERE status = $1 AND updated_at < $2 \
             ORDER BY updated_at LIMIT 500",
        )
        .bind(status)
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find stale reservations", e)
        })
    }

    /// Count records per status for a schedule.
    pub async fn count_by_status(
        &self,
        schedule_id: ScheduleId,
    ) -> AppResult<Vec<(SeatStatus, i64)>> {
        sqlx::query_as::<_, (SeatStatus, i64)>(
            "SELECT status, COUNT(*) FROM seat_reservations WHERE schedule_id = $1 \
             GROUP BY status ORDER BY status",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count reservations", e)
        })
    }
}
