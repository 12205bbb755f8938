//! Route definitions for the BoxOffice HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(seat_routes())
        .merge(payment_routes())
        .merge(queue_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Seat selection, auto-assignment and schedule status
fn seat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schedules/{schedule_id}/seats",
            get(handlers::seat::get_seats_status),
        )
        .route(
            "/schedules/{schedule_id}/seats/auto-assign",
            post(handlers::seat::auto_assign),
        )
        .route(
            "/schedules/{schedule_id}/seats/{seat_id}/select",
            post(handlers::seat::select_seat),
        )
}

/// Payment subsystem callback
fn payment_routes() -> Router<AppState> {
    Router::new().route(
        "/reservations/{reservation_id}/status",
        put(handlers::payment::set_reservation_status),
    )
}

/// Waiting room
fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/queue", post(handlers::queue::enqueue))
        .route("/queue/stats", get(handlers::queue::stats))
        .route("/queue/{token}", get(handlers::queue::status))
}

/// Liveness and dependency health
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
