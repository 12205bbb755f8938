//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use boxoffice_core::error::AppError;

/// Largest block a single auto-assign call may request.
pub const MAX_AUTO_ASSIGN: usize = 20;

/// Auto-assign request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AutoAssignRequest {
    /// Number of seats wanted.
    #[validate(range(min = 1, max = 20, message = "Between 1 and 20 seats may be requested"))]
    pub count: usize,
}

/// Payment callback body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationStatusRequest {
    /// `COMPLETED` after payment, `AVAILABLE` to release the seat.
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

/// Queue entry body. A missing token is generated by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EnqueueRequest {
    /// Client-held token.
    #[validate(length(max = 128, message = "Token must be at most 128 characters"))]
    pub token: Option<String>,
}

/// Run `validator` and map failures to a validation error.
pub fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
