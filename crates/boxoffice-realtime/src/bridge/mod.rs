//! Pub/sub backends for the notification channel.

pub mod memory_pubsub;
pub mod redis_pubsub;

pub use memory_pubsub::MemoryPubSub;
pub use redis_pubsub::RedisPubSub;
