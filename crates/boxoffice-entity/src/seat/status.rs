//! Seat reservation status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a (schedule, seat) reservation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seat_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// The seat can be selected.
    Available,
    /// The seat is soft-held pending payment.
    Reserved,
    /// Payment confirmed; the seat is sold.
    Completed,
    /// The reservation was canceled.
    Canceled,
}

impl SeatStatus {
    /// Whether the seat is taken (held or sold).
    pub fn is_taken(&self) -> bool {
        matches!(self, Self::Reserved | Self::Completed)
    }

    /// Return the status in its wire/cache form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = boxoffice_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(boxoffice_core::AppError::validation(format!(
                "Invalid seat status: '{s}'. Expected one of: AVAILABLE, RESERVED, COMPLETED, CANCELED"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("reserved".parse::<SeatStatus>().unwrap(), SeatStatus::Reserved);
        assert_eq!("COMPLETED".parse::<SeatStatus>().unwrap(), SeatStatus::Completed);
        assert!("sold".parse::<SeatStatus>().is_err());
    }

    #[test]
    fn test_taken_statuses() {
        assert!(SeatStatus::Reserved.is_taken());
        assert!(SeatStatus::Completed.is_taken());
        assert!(!SeatStatus::Available.is_taken());
        assert!(!SeatStatus::Canceled.is_taken());
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let json = serde_json::to_string(&SeatStatus::Available).unwrap();
        assert_eq!(json, "\"AVAILABLE\"");
    }
}
