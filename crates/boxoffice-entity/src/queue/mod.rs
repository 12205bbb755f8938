//! Waiting-room value objects.

pub mod stats;
pub mod token;

pub use stats::QueueStats;
pub use token::{AdmissionStatus, QueueToken};
