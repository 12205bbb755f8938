//! Maps domain errors and reservation outcomes to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_reservation::{MissingRecord, ReservationOutcome};

use crate::dto::response::ApiResponse;

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the same request may succeed if retried.
    pub retryable: bool,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorResponse {
    fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// HTTP wrapper around [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Capacity => (StatusCode::UNPROCESSABLE_ENTITY, "CAPACITY"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Configuration
            | ErrorKind::Serialization => {
                tracing::error!(kind = %err.kind, error = %err.message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.message
        };

        ApiErrorResponse {
            error: error_code.to_string(),
            message,
            retryable: err.kind.is_retryable(),
            details: None,
        }
        .into_response_with(status)
    }
}

/// HTTP wrapper around a [`ReservationOutcome`].
#[derive(Debug)]
pub struct Outcome<T>(pub ReservationOutcome<T>);

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self.0 {
            ReservationOutcome::Success(data) => {
                (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
            }
            ReservationOutcome::Conflict(conflict) => ApiErrorResponse {
                error: "CONFLICT".to_string(),
                message: format!(
                    "Seat {} of schedule {} is not available, try again",
                    conflict.seat_id, conflict.schedule_id
                ),
                retryable: true,
                details: serde_json::to_value(conflict).ok(),
            }
            .into_response_with(StatusCode::CONFLICT),
            ReservationOutcome::Capacity(shortfall) => ApiErrorResponse {
                error: "CAPACITY".to_string(),
                message: format!(
                    "Requested {} seats but only {} are available",
                    shortfall.requested, shortfall.available
                ),
                retryable: false,
                details: serde_json::to_value(shortfall).ok(),
            }
            .into_response_with(StatusCode::UNPROCESSABLE_ENTITY),
            ReservationOutcome::NotFound(missing) => {
                let message = match &missing {
                    MissingRecord::Seat {
                        schedule_id,
                        seat_id,
                    } => format!("Seat {seat_id} does not exist in schedule {schedule_id}"),
                    MissingRecord::Reservation { reservation_id } => {
                        format!("Reservation {reservation_id} does not exist")
                    }
                };
                ApiErrorResponse {
                    error: "NOT_FOUND".to_string(),
                    message,
                    retryable: false,
                    details: serde_json::to_value(missing).ok(),
                }
                .into_response_with(StatusCode::NOT_FOUND)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use boxoffice_core::types::{ScheduleId, SeatId};
    use boxoffice_reservation::{CapacityShortfall, SeatConflict};

    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::not_found("gone"), StatusCode::NOT_FOUND),
            (AppError::capacity("full"), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::cache("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::service_unavailable("closing"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_outcome_status_mapping() {
        let ok: Outcome<u32> = Outcome(ReservationOutcome::Success(1));
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let conflict: Outcome<u32> = Outcome(ReservationOutcome::Conflict(
            SeatConflict::busy(ScheduleId(1), SeatId(5)),
        ));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let capacity: Outcome<u32> = Outcome(ReservationOutcome::Capacity(CapacityShortfall {
            schedule_id: ScheduleId(1),
            requested: 4,
            available: 2,
        }));
        assert_eq!(
            capacity.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
