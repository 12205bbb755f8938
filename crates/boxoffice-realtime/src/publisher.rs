//! Publisher abstraction and the fire-and-forget notifier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use boxoffice_core::config::RealtimeConfig;
use boxoffice_core::events::{DomainEvent, EventPayload, QueueEvent, SeatEvent};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{ScheduleId, SeatId};

use crate::bridge::{MemoryPubSub, RedisPubSub};
use crate::message::types::OutboundMessage;

/// Topic-based message publisher.
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Publish one message. Returns the number of receivers reached, when
    /// the backend reports it.
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> AppResult<usize>;
}

/// Routes domain events to their topics. Publishing never fails the
/// caller: errors are logged and dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    publisher: Arc<dyn EventPublisher>,
    queue_topic: String,
    seat_topic: String,
}

impl Notifier {
    /// Create a notifier over an existing publisher.
    pub fn new(publisher: Arc<dyn EventPublisher>, config: &RealtimeConfig) -> Self {
        Self {
            publisher,
            queue_topic: config.queue_topic.clone(),
            seat_topic: config.seat_topic.clone(),
        }
    }

    /// Build the publisher selected by configuration.
    ///
    /// `redis_url` is only used by the Redis publisher.
    pub async fn from_config(config: &RealtimeConfig, redis_url: &str) -> AppResult<Self> {
        let publisher: Arc<dyn EventPublisher> = match config.publisher.as_str() {
            "redis" => Arc::new(RedisPubSub::connect(redis_url).await?),
            "memory" => Arc::new(MemoryPubSub::new(config.channel_buffer_size)),
            other => {
                return Err(boxoffice_core::AppError::configuration(format!(
                    "Unknown publisher: '{other}'. Supported: memory, redis"
                )));
            }
        };
        Ok(Self::new(publisher, config))
    }

    /// Publish a domain event on the topic for its domain.
    pub async fn notify(&self, event: DomainEvent) {
        let topic = match event.payload {
            EventPayload::Queue(_) => &self.queue_topic,
            EventPayload::Seat(_) => &self.seat_topic,
        };
        let message = OutboundMessage::from(&event);
        match self.publisher.publish(topic, &message).await {
            Ok(receivers) => debug!(topic = %topic, kind = message.kind(), receivers, "Event published"),
            Err(e) => warn!(topic = %topic, kind = message.kind(), error = %e, "Failed to publish event"),
        }
    }

    /// Announce that `token` may enter.
    pub async fn queue_admitted(&self, token: &str, shard: Option<u64>) {
        self.notify(DomainEvent::from(QueueEvent::Admitted {
            token: token.to_string(),
            shard,
        }))
        .await;
    }

    /// Announce a committed seat status.
    pub async fn seat_status_changed(&self, schedule_id: ScheduleId, seat_id: SeatId, status: &str) {
        self.notify(DomainEvent::from(SeatEvent::StatusChanged {
            schedule_id,
            seat_id,
            status: status.to_string(),
        }))
        .await;
    }

    /// Announce that an abandoned hold was released.
    pub async fn hold_expired(&self, schedule_id: ScheduleId, seat_id: SeatId) {
        self.notify(DomainEvent::from(SeatEvent::HoldExpired {
            schedule_id,
            seat_id,
        }))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::AppError;

    #[derive(Debug)]
    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _topic: &str, _message: &OutboundMessage) -> AppResult<usize> {
            Err(AppError::service_unavailable("broker down"))
        }
    }

    #[tokio::test]
    async fn test_events_route_to_domain_topics() {
        let pubsub = Arc::new(MemoryPubSub::new(16));
        let config = RealtimeConfig::default();
        let mut queue_rx = pubsub.subscribe(&config.queue_topic).await;
        let mut seat_rx = pubsub.subscribe(&config.seat_topic).await;
        let notifier = Notifier::new(pubsub.clone(), &config);

        notifier.queue_admitted("t1", Some(1)).await;
        notifier
            .seat_status_changed(ScheduleId(1), SeatId(2), "RESERVED")
            .await;

        assert!(matches!(
            queue_rx.recv().await.unwrap(),
            OutboundMessage::QueueAdmitted { token, .. } if token == "t1"
        ));
        assert!(matches!(
            seat_rx.recv().await.unwrap(),
            OutboundMessage::SeatStatusChanged { status, .. } if status == "RESERVED"
        ));
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let notifier = Notifier::new(Arc::new(FailingPublisher), &RealtimeConfig::default());
        notifier.queue_admitted("t1", None).await;
    }
}
