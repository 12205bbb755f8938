//! In-memory pub/sub for single-node deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;

use boxoffice_core::result::AppResult;

use crate::message::types::OutboundMessage;
use crate::publisher::EventPublisher;

/// In-memory pub/sub implementation.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Topic name → broadcast sender
    channels: RwLock<HashMap<String, broadcast::Sender<OutboundMessage>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl MemoryPubSub {
    /// Create a new in-memory pub/sub
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size,
        }
    }

    /// Subscribe to a topic, returns a receiver
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<OutboundMessage> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tx.subscribe()
    }
}

#[async_trait]
impl EventPublisher for MemoryPubSub {
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> AppResult<usize> {
        let channels = self.channels.read().await;
        // No subscriber is not an error for a fire-and-forget channel.
        Ok(channels
            .get(topic)
            .and_then(|tx| tx.send(message.clone()).ok())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn admitted(token: &str) -> OutboundMessage {
        OutboundMessage::QueueAdmitted {
            token: token.to_string(),
            shard: Some(1),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_topic_messages() {
        let pubsub = MemoryPubSub::new(16);
        let mut rx = pubsub.subscribe("queue.admitted").await;
        let message = admitted("t1");
        let delivered = pubsub.publish("queue.admitted", &message).await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap(), message);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let pubsub = MemoryPubSub::new(16);
        let mut seats = pubsub.subscribe("seat.status").await;
        pubsub.publish("queue.admitted", &admitted("t1")).await.unwrap();
        assert!(seats.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let pubsub = MemoryPubSub::new(16);
        assert_eq!(pubsub.publish("nobody", &admitted("t1")).await.unwrap(), 0);
    }
}
