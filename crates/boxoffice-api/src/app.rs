//! Application builder: wires router, middleware and state into an Axum app
//! and runs the server with its background tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use boxoffice_cache::CacheManager;
use boxoffice_core::config::AppConfig;
use boxoffice_core::error::AppError;
use boxoffice_database::DatabasePool;
use boxoffice_queue::AdmissionController;
use boxoffice_realtime::Notifier;
use boxoffice_reservation::{
    HoldReaper, MemoryReservationStore, PostgresReservationStore, ReservationStore,
    SeatReservationEngine,
};
use boxoffice_worker::{
    AdmissionTicker, CronScheduler, HoldReaperTask, PeriodicRunner, WorkerPool,
};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let cors = build_cors_layer(&state.config.server);

    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Select the reservation store named by configuration.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn ReservationStore>, AppError> {
    match config.reservation.store.as_str() {
        "postgres" => {
            tracing::info!("Connecting to database...");
            let db = DatabasePool::connect(&config.database).await?;
            db.migrate().await?;
            Ok(Arc::new(PostgresReservationStore::new(db)))
        }
        "memory" => {
            let store = MemoryReservationStore::with_layouts(&config.reservation.seed);
            tracing::warn!(
                layouts = config.reservation.seed.len(),
                "Using in-memory reservation store; state is lost on restart"
            );
            Ok(Arc::new(store))
        }
        other => Err(AppError::configuration(format!(
            "Unknown reservation store: '{other}'. Supported: memory, postgres"
        ))),
    }
}

/// Runs the BoxOffice server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BoxOffice server...");

    // ── Step 1: Lease cache and notification channel ─────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache...");
    let cache = CacheManager::new(&config.cache).await?;
    let notifier = Notifier::from_config(&config.realtime, &config.cache.redis.url).await?;

    // ── Step 2: Reservation store ────────────────────────────────
    let store = build_store(&config).await?;

    // ── Step 3: Engine, waiting room, worker pool ────────────────
    let engine = Arc::new(SeatReservationEngine::new(
        cache.provider(),
        Arc::clone(&store),
        notifier.clone(),
        &config.reservation,
    ));
    let queue = Arc::new(AdmissionController::new(
        cache.clone(),
        notifier,
        &config.queue,
    ));
    let pool = WorkerPool::new(config.worker.concurrency, config.worker.queue_capacity);

    // ── Step 4: Background tasks ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut background = Vec::new();
    let mut scheduler = None;

    if config.worker.enabled {
        let ticker = PeriodicRunner::new(
            Arc::new(AdmissionTicker::new(Arc::clone(&queue))),
            config.queue.interval(),
        );
        background.push(ticker.spawn(shutdown_rx.clone()));

        let reaper = PeriodicRunner::new(
            Arc::new(HoldReaperTask::new(HoldReaper::new(Arc::clone(&engine)))),
            Duration::from_secs(config.worker.reaper_interval_seconds),
        );
        background.push(reaper.spawn(shutdown_rx.clone()));

        let cron = CronScheduler::new(Arc::clone(&queue)).await?;
        cron.register_daily_stats(&config.worker.stats_cron).await?;
        cron.start().await?;
        scheduler = Some(cron);
    } else {
        tracing::info!("Background workers disabled");
    }

    // ── Step 5: HTTP server ──────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        cache,
        store,
        engine,
        queue,
        pool,
        started_at: Instant::now(),
    };

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("BoxOffice server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 6: Drain background tasks ───────────────────────────
    for handle in background {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Background task did not stop within the grace period");
        }
    }
    if let Some(mut cron) = scheduler {
        cron.shutdown().await?;
    }

    tracing::info!("BoxOffice server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
