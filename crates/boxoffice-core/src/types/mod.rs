//! Core type definitions used across the BoxOffice workspace.

pub mod id;

pub use id::*;
