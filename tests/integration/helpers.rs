//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use boxoffice_cache::CacheManager;
use boxoffice_cache::memory::MemoryCacheProvider;
use boxoffice_core::config::{QueueConfig, RealtimeConfig, ReservationConfig};
use boxoffice_core::traits::cache::CacheProvider;
use boxoffice_core::types::{ScheduleId, SeatId};
use boxoffice_entity::seat::Seat;
use boxoffice_queue::AdmissionController;
use boxoffice_realtime::{MemoryPubSub, Notifier};
use boxoffice_reservation::{MemoryReservationStore, SeatReservationEngine};

/// Schedule used by every seat test.
pub const SCHEDULE: ScheduleId = ScheduleId(100);

/// Build one row of `count` seats. Seat `n` of row `A` gets ID `n`, of
/// row `B` gets ID `100 + n`, and so on.
pub fn row(label: &str, count: i32) -> Vec<Seat> {
    let base = i64::from(label.as_bytes()[0] - b'A') * 100;
    (1..=count)
        .map(|number| Seat::new(SeatId(base + i64::from(number)), SCHEDULE, "R", label, number))
        .collect()
}

/// Seat engine over an in-memory cache and store.
pub struct SeatTestApp {
    /// The engine under test.
    pub engine: Arc<SeatReservationEngine>,
    /// The lease cache shared with the engine.
    pub cache: Arc<dyn CacheProvider>,
    /// The store shared with the engine.
    pub store: Arc<MemoryReservationStore>,
    /// Captures published events.
    pub pubsub: Arc<MemoryPubSub>,
}

impl SeatTestApp {
    /// Create an engine whose catalog holds `seats`.
    pub fn new(seats: Vec<Seat>) -> Self {
        Self::with_config(seats, ReservationConfig::default())
    }

    /// Create an engine with explicit reservation settings.
    pub fn with_config(seats: Vec<Seat>, config: ReservationConfig) -> Self {
        let cache: Arc<dyn CacheProvider> = Arc::new(MemoryCacheProvider::default());
        let store = Arc::new(MemoryReservationStore::with_seats(seats));
        let pubsub = Arc::new(MemoryPubSub::new(1024));
        let notifier = Notifier::new(pubsub.clone(), &RealtimeConfig::default());
        let engine = Arc::new(SeatReservationEngine::new(
            Arc::clone(&cache),
            store.clone(),
            notifier,
            &config,
        ));
        Self {
            engine,
            cache,
            store,
            pubsub,
        }
    }
}

/// Waiting-room controller over an in-memory cache.
pub struct QueueTestApp {
    /// The controller under test.
    pub queue: Arc<AdmissionController>,
    /// Captures published events.
    pub pubsub: Arc<MemoryPubSub>,
}

impl QueueTestApp {
    /// Create a controller with the given settings.
    pub fn new(config: QueueConfig) -> Self {
        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::default()));
        let pubsub = Arc::new(MemoryPubSub::new(1024));
        let notifier = Notifier::new(pubsub.clone(), &RealtimeConfig::default());
        Self {
            queue: Arc::new(AdmissionController::new(cache, notifier, &config)),
            pubsub,
        }
    }
}
