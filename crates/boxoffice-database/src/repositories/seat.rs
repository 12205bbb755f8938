//! Seat catalog repository implementation.

use sqlx::PgPool;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ScheduleId, SeatId};
use boxoffice_entity::seat::Seat;

/// Data required to insert a catalog seat.
#[derive(Debug, Clone)]
pub struct NewSeat {
    /// Section label.
    pub section: String,
    /// Row label.
    pub row_label: String,
    /// Seat number within the row.
    pub number: i32,
}

/// Repository for the seat catalog.
#[derive(Debug, Clone)]
pub struct SeatRepository {
    pool: PgPool,
}

impl SeatRepository {
    /// Create a new seat repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a seat by ID.
    pub async fn find_by_id(&self, id: SeatId) -> AppResult<Option<Seat>> {
        sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find seat", e))
    }

    /// Find several seats by ID. Missing IDs are silently skipped.
    pub async fn find_by_ids(&self, ids: &[SeatId]) -> AppResult<Vec<Seat>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE id = ANY($1) ORDER BY id")
            .bind(raw)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find seats", e))
    }

    /// List the full catalog for a schedule.
    pub async fn find_by_schedule(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>> {
        sqlx::query_as::<_, Seat>(
            "SELECT * FROM seats WHERE schedule_id = $1 ORDER BY row_label, number",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list schedule seats", e)
        })
    }

    /// Count catalog seats for a schedule.
    pub async fn count_by_schedule(&self, schedule_id: ScheduleId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM seats WHERE schedule_id = $1")
            .bind(schedule_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count seats", e))
    }

    /// Insert catalog seats for a schedule, skipping positions that already
    /// exist. Returns the number of rows inserted.
    pub async fn create_many(&self, schedule_id: ScheduleId, seats: &[NewSeat]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut inserted = 0;
        for seat in seats {
            let result = sqlx::query(
                "INSERT INTO seats (schedule_id, section, row_label, number) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (schedule_id, row_label, number) DO NOTHING",
            )
            .bind(schedule_id)
            .bind(&seat.section)
            .bind(&seat.row_label)
            .bind(seat.number)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert seat", e))?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit seat insert", e)
        })?;
        Ok(inserted)
    }
}
