//! Waiting-room handlers.

use axum::Json;
use axum::extract::{Path, State};

use boxoffice_entity::queue::{QueueStats, QueueToken};

use crate::dto::request::{EnqueueRequest, validate};
use crate::dto::response::{ApiResponse, QueueStatusResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/queue
pub async fn enqueue(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<ApiResponse<QueueToken>>, ApiError> {
    validate(&req)?;

    let ticket = state.queue.enqueue(req.token).await?;
    Ok(Json(ApiResponse::ok(ticket)))
}

/// GET /api/queue/{token}
pub async fn status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<QueueStatusResponse>>, ApiError> {
    let status = state.queue.status(&token).await?;
    Ok(Json(ApiResponse::ok(QueueStatusResponse { token, status })))
}

/// GET /api/queue/stats
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<QueueStats>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.queue.stats().await?)))
}
