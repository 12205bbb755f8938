//! Wire messages relayed to waiting clients.

pub mod types;

pub use types::OutboundMessage;
