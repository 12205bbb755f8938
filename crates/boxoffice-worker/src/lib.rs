//! Background processing for BoxOffice.
//!
//! This crate provides:
//! - A bounded worker pool with a run-on-caller overload policy
//! - A periodic runner that drives the admission tick and the hold reaper
//! - A cron scheduler for the daily queue statistics snapshot

pub mod jobs;
pub mod pool;
pub mod runner;
pub mod scheduler;

pub use jobs::{AdmissionTicker, HoldReaperTask, PeriodicJob};
pub use pool::WorkerPool;
pub use runner::PeriodicRunner;
pub use scheduler::CronScheduler;
