//! Release of abandoned seat holds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use boxoffice_core::result::AppResult;

use crate::engine::SeatReservationEngine;

/// Returns seats that were held but never paid for to the pool.
///
/// A hold is abandoned once its record has stayed RESERVED for longer than
/// the hold TTL.
#[derive(Debug, Clone)]
pub struct HoldReaper {
    engine: Arc<SeatReservationEngine>,
    stale_after: Duration,
}

impl HoldReaper {
    /// Create a reaper that treats holds older than the engine's hold TTL
    /// as abandoned.
    pub fn new(engine: Arc<SeatReservationEngine>) -> Self {
        let stale_after = engine.hold_ttl();
        Self {
            engine,
            stale_after,
        }
    }

    /// Override the age after which a hold counts as abandoned.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Run one sweep. Returns how many holds were released.
    pub async fn run_once(&self) -> AppResult<usize> {
        let released = self.engine.release_stale_holds(self.stale_after).await?;
        if released > 0 {
            info!(released, "Hold reaper released abandoned seats");
        } else {
            debug!("Hold reaper found nothing to release");
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use boxoffice_cache::memory::MemoryCacheProvider;
    use boxoffice_core::config::{RealtimeConfig, ReservationConfig};
    use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
    use boxoffice_entity::reservation::SeatReservation;
    use boxoffice_entity::seat::{Seat, SeatStatus};
    use boxoffice_realtime::{MemoryPubSub, Notifier};

    use super::*;
    use crate::store::{MemoryReservationStore, ReservationStore};

    #[tokio::test]
    async fn test_run_once_releases_only_old_holds() {
        let schedule = ScheduleId(7);
        let store = Arc::new(MemoryReservationStore::with_seats([
            Seat::new(SeatId(1), schedule, "R", "A", 1),
            Seat::new(SeatId(2), schedule, "R", "A", 2),
        ]));
        let then = Utc::now() - chrono::Duration::seconds(90);
        store
            .insert_reservation(SeatReservation {
                id: ReservationId(1),
                schedule_id: schedule,
                seat_id: SeatId(1),
                status: SeatStatus::Reserved,
                created_at: then,
                updated_at: then,
            })
            .await;

        let engine = Arc::new(SeatReservationEngine::new(
            Arc::new(MemoryCacheProvider::default()),
            store.clone(),
            Notifier::new(Arc::new(MemoryPubSub::new(8)), &RealtimeConfig::default()),
            &ReservationConfig::default(),
        ));

        let reaper = HoldReaper::new(Arc::clone(&engine));
        assert_eq!(reaper.run_once().await.unwrap(), 0);

        let reaper = reaper.with_stale_after(Duration::from_secs(60));
        assert_eq!(reaper.run_once().await.unwrap(), 1);
        assert_eq!(reaper.run_once().await.unwrap(), 0);

        let record = store.find_reservation(schedule, SeatId(1)).await.unwrap();
        assert_eq!(record.unwrap().status, SeatStatus::Available);
    }
}
