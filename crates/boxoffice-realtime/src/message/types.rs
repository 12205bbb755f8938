//! Outbound message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::events::{DomainEvent, EventPayload, QueueEvent, SeatEvent};
use boxoffice_core::types::{ScheduleId, SeatId};

/// Messages published for the push relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A waiting token may now enter.
    QueueAdmitted {
        /// The admitted token.
        token: String,
        /// Shard the token left; absent for fast-path admission.
        shard: Option<u64>,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A seat's status changed.
    SeatStatusChanged {
        /// Schedule.
        schedule_id: ScheduleId,
        /// Seat.
        seat_id: SeatId,
        /// New status.
        status: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl OutboundMessage {
    /// Topic-independent routing hint used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueueAdmitted { .. } => "queue_admitted",
            Self::SeatStatusChanged { .. } => "seat_status_changed",
        }
    }
}

impl From<&DomainEvent> for OutboundMessage {
    fn from(event: &DomainEvent) -> Self {
        let timestamp = event.timestamp;
        match &event.payload {
            EventPayload::Queue(QueueEvent::Admitted { token, shard }) => Self::QueueAdmitted {
                token: token.clone(),
                shard: *shard,
                timestamp,
            },
            EventPayload::Seat(SeatEvent::StatusChanged {
                schedule_id,
                seat_id,
                status,
            }) => Self::SeatStatusChanged {
                schedule_id: *schedule_id,
                seat_id: *seat_id,
                status: status.clone(),
                timestamp,
            },
            EventPayload::Seat(SeatEvent::HoldExpired {
                schedule_id,
                seat_id,
            }) => Self::SeatStatusChanged {
                schedule_id: *schedule_id,
                seat_id: *seat_id,
                status: "AVAILABLE".to_string(),
                timestamp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_expired_is_relayed_as_available() {
        let event = DomainEvent::from(SeatEvent::HoldExpired {
            schedule_id: ScheduleId(1),
            seat_id: SeatId(9),
        });
        match OutboundMessage::from(&event) {
            OutboundMessage::SeatStatusChanged { status, seat_id, .. } => {
                assert_eq!(status, "AVAILABLE");
                assert_eq!(seat_id, SeatId(9));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_wire_format_is_snake_case_tagged() {
        let event = DomainEvent::from(QueueEvent::Admitted {
            token: "abc".to_string(),
            shard: Some(2),
        });
        let json = serde_json::to_value(OutboundMessage::from(&event)).unwrap();
        assert_eq!(json["type"], "queue_admitted");
        assert_eq!(json["token"], "abc");
        assert_eq!(json["shard"], 2);
    }
}
