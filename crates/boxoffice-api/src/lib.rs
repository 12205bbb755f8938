//! # boxoffice-api
//!
//! HTTP API layer for BoxOffice built on Axum.
//!
//! A thin surface over the seat reservation engine and the waiting room:
//! seat selection, auto-assignment, schedule status, queue entry and
//! polling, and the payment callback. Engine calls run on the bounded
//! worker pool.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
