//! Redis pub/sub publisher for multi-node deployments.

#[cfg(feature = "redis-pubsub")]
mod implementation {
    use async_trait::async_trait;
    use redis::aio::ConnectionManager;
    use tracing::info;

    use boxoffice_core::error::{AppError, ErrorKind};
    use boxoffice_core::result::AppResult;

    use crate::message::types::OutboundMessage;
    use crate::publisher::EventPublisher;

    /// Publishes outbound messages as JSON on Redis channels.
    #[derive(Clone)]
    pub struct RedisPubSub {
        conn: ConnectionManager,
    }

    impl std::fmt::Debug for RedisPubSub {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RedisPubSub").finish_non_exhaustive()
        }
    }

    impl RedisPubSub {
        /// Connect to Redis.
        pub async fn connect(url: &str) -> AppResult<Self> {
            let client = redis::Client::open(url).map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid Redis URL", e)
            })?;
            let conn = client.get_connection_manager().await.map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Redis connection failed", e)
            })?;
            info!("Redis pub/sub publisher connected");
            Ok(Self { conn })
        }
    }

    #[async_trait]
    impl EventPublisher for RedisPubSub {
        async fn publish(&self, topic: &str, message: &OutboundMessage) -> AppResult<usize> {
            let payload = serde_json::to_string(message)?;
            let mut conn = self.conn.clone();
            let receivers: i64 = redis::cmd("PUBLISH")
                .arg(topic)
                .arg(payload)
                .query_async(&mut conn)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Cache, "Redis PUBLISH failed", e))?;
            Ok(usize::try_from(receivers).unwrap_or(0))
        }
    }
}

#[cfg(not(feature = "redis-pubsub"))]
mod implementation {
    use boxoffice_core::error::AppError;
    use boxoffice_core::result::AppResult;

    /// Placeholder when the `redis-pubsub` feature is disabled.
    #[derive(Debug, Clone)]
    pub struct RedisPubSub;

    impl RedisPubSub {
        /// Always fails: the feature is compiled out.
        pub async fn connect(_url: &str) -> AppResult<Self> {
            Err(AppError::configuration(
                "Redis publisher requested but the redis-pubsub feature is disabled",
            ))
        }
    }
}

pub use implementation::RedisPubSub;
