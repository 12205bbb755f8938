//! Health check handlers.

use axum::Json;
use axum::extract::State;

use boxoffice_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let cache_ok = state.cache.health_check().await.unwrap_or(false);
    let store_ok = state.store.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: if cache_ok && store_ok { "ok" } else { "degraded" }.to_string(),
        cache: if cache_ok { "connected" } else { "unreachable" }.to_string(),
        store: if store_ok { "connected" } else { "unreachable" }.to_string(),
        pool_queued: state.pool.queued(),
    }))
}
