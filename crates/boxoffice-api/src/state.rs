//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use boxoffice_cache::CacheManager;
use boxoffice_core::config::AppConfig;
use boxoffice_queue::AdmissionController;
use boxoffice_reservation::{ReservationStore, SeatReservationEngine};
use boxoffice_worker::WorkerPool;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Lease cache
    pub cache: CacheManager,
    /// Reservation store
    pub store: Arc<dyn ReservationStore>,
    /// Seat reservation engine
    pub engine: Arc<SeatReservationEngine>,
    /// Waiting room
    pub queue: Arc<AdmissionController>,
    /// Bounded pool that engine calls run on
    pub pool: WorkerPool,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}
