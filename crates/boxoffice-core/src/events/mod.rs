//! Domain events emitted by BoxOffice operations.
//!
//! Events are handed to the notification channel and relayed to waiting
//! clients by an external push service.

pub mod queue;
pub mod seat;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use queue::QueueEvent;
pub use seat::SeatEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A seat-related event.
    Seat(SeatEvent),
    /// A waiting-room event.
    Queue(QueueEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

impl From<SeatEvent> for DomainEvent {
    fn from(event: SeatEvent) -> Self {
        Self::new(EventPayload::Seat(event))
    }
}

impl From<QueueEvent> for DomainEvent {
    fn from(event: QueueEvent) -> Self {
        Self::new(EventPayload::Queue(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScheduleId, SeatId};

    #[test]
    fn test_event_serializes_with_domain_tag() {
        let event = DomainEvent::from(SeatEvent::StatusChanged {
            schedule_id: ScheduleId(3),
            seat_id: SeatId(14),
            status: "RESERVED".to_string(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["domain"], "Seat");
        assert_eq!(json["payload"]["event"]["type"], "StatusChanged");
        assert_eq!(json["payload"]["event"]["seat_id"], 14);
    }
}
