//! # boxoffice-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the seat catalog and seat reservations.

pub mod connection;
pub mod repositories;

pub use connection::{DatabasePool, redact_url};
