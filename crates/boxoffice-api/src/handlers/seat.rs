//! Seat selection and schedule status handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use boxoffice_core::types::{ScheduleId, SeatId};

use crate::dto::request::{AutoAssignRequest, validate};
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, Outcome};
use crate::state::AppState;

/// GET /api/schedules/{schedule_id}/seats
pub async fn get_seats_status(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Response, ApiError> {
    let engine = Arc::clone(&state.engine);
    let seats = state
        .pool
        .run(async move { engine.get_seats_status(schedule_id).await })
        .await??;

    Ok(Json(ApiResponse::ok(seats)).into_response())
}

/// POST /api/schedules/{schedule_id}/seats/{seat_id}/select
pub async fn select_seat(
    State(state): State<AppState>,
    Path((schedule_id, seat_id)): Path<(ScheduleId, SeatId)>,
) -> Result<Response, ApiError> {
    let engine = Arc::clone(&state.engine);
    let outcome = state
        .pool
        .run(async move { engine.select_seat(schedule_id, seat_id).await })
        .await??;

    Ok(Outcome(outcome).into_response())
}

/// POST /api/schedules/{schedule_id}/seats/auto-assign
pub async fn auto_assign(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
    Json(req): Json<AutoAssignRequest>,
) -> Result<Response, ApiError> {
    validate(&req)?;

    let engine = Arc::clone(&state.engine);
    let outcome = state
        .pool
        .run(async move { engine.auto_assign_seats(schedule_id, req.count).await })
        .await??;

    Ok(Outcome(outcome).into_response())
}
