//! Notification channel configuration.

use serde::{Deserialize, Serialize};

/// Notification channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Publisher backend: `"memory"` or `"redis"`.
    #[serde(default = "default_publisher")]
    pub publisher: String,
    /// Internal channel buffer size for broadcast channels.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Topic for queue readiness events.
    #[serde(default = "default_queue_topic")]
    pub queue_topic: String,
    /// Topic for seat status events.
    #[serde(default = "default_seat_topic")]
    pub seat_topic: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
            channel_buffer_size: default_channel_buffer(),
            queue_topic: default_queue_topic(),
            seat_topic: default_seat_topic(),
        }
    }
}

fn default_publisher() -> String {
    "memory".to_string()
}

fn default_channel_buffer() -> usize {
    256
}

fn default_queue_topic() -> String {
    "queue.admitted".to_string()
}

fn default_seat_topic() -> String {
    "seat.status".to_string()
}
