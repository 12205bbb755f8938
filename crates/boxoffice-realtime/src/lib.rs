//! # boxoffice-realtime
//!
//! Notification channel for BoxOffice. Provides:
//!
//! - An [`EventPublisher`] abstraction over topic-based pub/sub
//! - In-memory broadcast pub/sub for single-node deployments
//! - Redis pub/sub for multi-node deployments
//! - A fire-and-forget [`Notifier`] used by the reservation engine and
//!   the admission controller
//!
//! Delivery to browsers is done by an external push relay subscribed to
//! the configured topics.

pub mod bridge;
pub mod message;
pub mod publisher;

pub use bridge::MemoryPubSub;
pub use message::OutboundMessage;
pub use publisher::{EventPublisher, Notifier};
