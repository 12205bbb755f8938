//! # boxoffice-cache
//!
//! Lease cache providers for BoxOffice. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. The
//! [`lock`] module builds mutual exclusion on top of either provider.

pub mod keys;
pub mod lock;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use keys::{QueueKeys, SeatKey};
pub use lock::{LockManager, LockOutcome};
pub use provider::CacheManager;
