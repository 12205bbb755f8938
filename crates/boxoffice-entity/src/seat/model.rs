//! Seat entity model.

use serde::{Deserialize, Serialize};

use boxoffice_core::types::{ScheduleId, SeatId};

/// A seat offered for one schedule. Immutable catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Seat {
    /// Unique seat ID.
    pub id: SeatId,
    /// Schedule the seat is offered for.
    pub schedule_id: ScheduleId,
    /// Section label (e.g. `"VIP"`, `"R"`).
    pub section: String,
    /// Row label (e.g. `"A"`).
    pub row_label: String,
    /// Seat number within the row.
    pub number: i32,
}

impl Seat {
    /// Create a catalog seat.
    pub fn new(
        id: SeatId,
        schedule_id: ScheduleId,
        section: impl Into<String>,
        row_label: impl Into<String>,
        number: i32,
    ) -> Self {
        Self {
            id,
            schedule_id,
            section: section.into(),
            row_label: row_label.into(),
            number,
        }
    }

    /// Human-readable label such as `A5`.
    pub fn label(&self) -> String {
        format!("{}{}", self.row_label, self.number)
    }
}
