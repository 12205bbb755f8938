//! Payment subsystem callback.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use boxoffice_core::types::ReservationId;
use boxoffice_entity::seat::SeatStatus;

use crate::dto::request::{ReservationStatusRequest, validate};
use crate::error::{ApiError, Outcome};
use crate::state::AppState;

/// PUT /api/reservations/{reservation_id}/status
///
/// `COMPLETED` after a successful payment, `AVAILABLE` after a failed or
/// cancelled one.
pub async fn set_reservation_status(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
    Json(req): Json<ReservationStatusRequest>,
) -> Result<Response, ApiError> {
    validate(&req)?;
    let status: SeatStatus = req.status.parse()?;

    let engine = Arc::clone(&state.engine);
    let outcome = state
        .pool
        .run(async move { engine.set_reservation_status(reservation_id, status).await })
        .await??;

    Ok(Outcome(outcome).into_response())
}
