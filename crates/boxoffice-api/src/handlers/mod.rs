//! Request handlers, one module per domain.

pub mod health;
pub mod payment;
pub mod queue;
pub mod seat;
