//! In-memory reservation store for single-node use and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use boxoffice_core::config::SeatLayout;
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
use boxoffice_entity::reservation::SeatReservation;
use boxoffice_entity::seat::{Seat, SeatStatus};

use super::ReservationStore;

#[derive(Debug, Default)]
struct StoreState {
    seats: BTreeMap<SeatId, Seat>,
    reservations: HashMap<(ScheduleId, SeatId), SeatReservation>,
    next_reservation_id: i64,
}

impl StoreState {
    fn next_id(&mut self) -> ReservationId {
        self.next_reservation_id += 1;
        ReservationId(self.next_reservation_id)
    }

    fn upsert(
        &mut self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
        status: SeatStatus,
    ) -> SeatReservation {
        let now = Utc::now();
        let existing = self.reservations.get(&(schedule_id, seat_id)).map(|r| r.id);
        let id = match existing {
            Some(id) => id,
            None => self.next_id(),
        };
        let record = self
            .reservations
            .entry((schedule_id, seat_id))
            .or_insert_with(|| SeatReservation {
                id,
                schedule_id,
                seat_id,
                status,
                created_at: now,
                updated_at: now,
            });
        record.status = status;
        record.updated_at = now;
        record.clone()
    }
}

/// Reservation store kept in process memory behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryReservationStore {
    state: RwLock<StoreState>,
}

impl MemoryReservationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a seat catalog.
    pub fn with_seats(seats: impl IntoIterator<Item = Seat>) -> Self {
        let state = StoreState {
            seats: seats.into_iter().map(|seat| (seat.id, seat)).collect(),
            ..StoreState::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Create a store whose catalog is generated from seat layouts. Seat ids
    /// run from 1 across all layouts in order.
    pub fn with_layouts(layouts: &[SeatLayout]) -> Self {
        let mut next_id = 0;
        let mut seats = Vec::new();
        for layout in layouts {
            let schedule_id = ScheduleId(layout.schedule_id);
            for row in layout.rows.iter().map(|row| row.trim()) {
                if row.is_empty() {
                    continue;
                }
                for number in 1..=layout.seats_per_row {
                    next_id += 1;
                    seats.push(Seat::new(
                        SeatId(next_id),
                        schedule_id,
                        layout.section.as_str(),
                        row,
                        number,
                    ));
                }
            }
        }
        Self::with_seats(seats)
    }

    /// Add a catalog seat.
    pub async fn add_seat(&self, seat: Seat) {
        self.state.write().await.seats.insert(seat.id, seat);
    }

    /// Insert a record as-is, replacing any record for the same pair.
    pub async fn insert_reservation(&self, record: SeatReservation) {
        let mut state = self.state.write().await;
        state.next_reservation_id = state.next_reservation_id.max(record.id.get());
        state
            .reservations
            .insert((record.schedule_id, record.seat_id), record);
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn find_seat(&self, seat_id: SeatId) -> AppResult<Option<Seat>> {
        Ok(self.state.read().await.seats.get(&seat_id).cloned())
    }

    async fn find_seats(&self, seat_ids: &[SeatId]) -> AppResult<Vec<Seat>> {
        let state = self.state.read().await;
        Ok(seat_ids
            .iter()
            .filter_map(|id| state.seats.get(id).cloned())
            .collect())
    }

    async fn list_seats(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>> {
        let state = self.state.read().await;
        Ok(state
            .seats
            .values()
            .filter(|seat| seat.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn find_reservation(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<Option<SeatReservation>> {
        let state = self.state.read().await;
        Ok(state.reservations.get(&(schedule_id, seat_id)).cloned())
    }

    async fn find_reservation_by_id(
        &self,
        id: ReservationId,
    ) -> AppResult<Option<SeatReservation>> {
        let state = self.state.read().await;
        Ok(state.reservations.values().find(|r| r.id == id).cloned())
    }

    async fn get_or_create_available(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<SeatReservation> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.reservations.get(&(schedule_id, seat_id)) {
            return Ok(existing.clone());
        }
        Ok(state.upsert(schedule_id, seat_id, SeatStatus::Available))
    }

    async fn list_reservations(&self, schedule_id: ScheduleId) -> AppResult<Vec<SeatReservation>> {
        let state = self.state.read().await;
        let mut records: Vec<SeatReservation> = state
            .reservations
            .values()
            .filter(|r| r.schedule_id == schedule_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.seat_id);
        Ok(records)
    }

    async fn list_by_status(
        &self,
        schedule_id: ScheduleId,
        status: SeatStatus,
    ) -> AppResult<Vec<SeatReservation>> {
        let mut records = self.list_reservations(schedule_id).await?;
        records.retain(|r| r.status == status);
        Ok(records)
    }

    async fn set_statuses(
        &self,
        schedule_id: ScheduleId,
        changes: &[(SeatId, SeatStatus)],
    ) -> AppResult<Vec<SeatReservation>> {
        let mut state = self.state.write().await;
        Ok(changes
            .iter()
            .map(|(seat_id, status)| state.upsert(schedule_id, *seat_id, *status))
            .collect())
    }

    async fn find_stale(
        &self,
        status: SeatStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<SeatReservation>> {
        let state = self.state.read().await;
        let mut records: Vec<SeatReservation> = state
            .reservations
            .values()
            .filter(|r| r.status == status && r.updated_at < before)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.updated_at);
        Ok(records)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryReservationStore {
        MemoryReservationStore::with_seats(
            (1..=3).map(|n| Seat::new(SeatId(n), ScheduleId(1), "R", "A", n as i32)),
        )
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = store();
        let first = store
            .get_or_create_available(ScheduleId(1), SeatId(1))
            .await
            .unwrap();
        let second = store
            .get_or_create_available(ScheduleId(1), SeatId(1))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, SeatStatus::Available);
    }

    #[tokio::test]
    async fn test_set_statuses_upserts_one_record_per_pair() {
        let store = store();
        store
            .set_statuses(ScheduleId(1), &[(SeatId(1), SeatStatus::Reserved)])
            .await
            .unwrap();
        store
            .set_statuses(ScheduleId(1), &[(SeatId(1), SeatStatus::Completed)])
            .await
            .unwrap();
        let records = store.list_reservations(ScheduleId(1)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SeatStatus::Completed);
        let by_id = store.find_reservation_by_id(records[0].id).await.unwrap();
        assert_eq!(by_id, Some(records[0].clone()));
    }

    #[tokio::test]
    async fn test_with_layouts_numbers_seats_across_layouts() {
        let store = MemoryReservationStore::with_layouts(&[
            SeatLayout {
                schedule_id: 1,
                section: "MAIN".to_string(),
                rows: vec!["A".to_string(), "B".to_string()],
                seats_per_row: 3,
            },
            SeatLayout {
                schedule_id: 2,
                section: "BALCONY".to_string(),
                rows: vec!["C".to_string(), " ".to_string()],
                seats_per_row: 2,
            },
        ]);

        let first = store.list_seats(ScheduleId(1)).await.unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first[3].row_label, "B");
        assert_eq!(first[3].number, 1);

        let second = store.list_seats(ScheduleId(2)).await.unwrap();
        let ids: Vec<SeatId> = second.iter().map(|seat| seat.id).collect();
        assert_eq!(ids, vec![SeatId(7), SeatId(8)]);
        assert_eq!(second[0].section, "BALCONY");
    }

    #[tokio::test]
    async fn test_list_seats_filters_by_schedule() {
        let store = store();
        store
            .add_seat(Seat::new(SeatId(10), ScheduleId(2), "R", "A", 1))
            .await;
        assert_eq!(store.list_seats(ScheduleId(1)).await.unwrap().len(), 3);
        assert_eq!(store.list_seats(ScheduleId(2)).await.unwrap().len(), 1);
    }
}
