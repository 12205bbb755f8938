//! Core traits defined in `boxoffice-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
