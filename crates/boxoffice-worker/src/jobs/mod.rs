//! Periodic job definitions.

pub mod admission;
pub mod reaper;

use async_trait::async_trait;

use boxoffice_core::result::AppResult;

pub use admission::AdmissionTicker;
pub use reaper::HoldReaperTask;

/// A unit of background work run at a fixed interval.
#[async_trait]
pub trait PeriodicJob: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run once. Returns the number of items the run acted on.
    async fn run_once(&self) -> AppResult<usize>;
}
