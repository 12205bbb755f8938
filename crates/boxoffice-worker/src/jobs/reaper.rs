//! Abandoned hold release job.

use async_trait::async_trait;

use boxoffice_core::result::AppResult;
use boxoffice_reservation::HoldReaper;

use super::PeriodicJob;

/// Returns abandoned seat holds to the pool.
#[derive(Debug, Clone)]
pub struct HoldReaperTask {
    reaper: HoldReaper,
}

impl HoldReaperTask {
    /// Create the job.
    pub fn new(reaper: HoldReaper) -> Self {
        Self { reaper }
    }
}

#[async_trait]
impl PeriodicJob for HoldReaperTask {
    fn name(&self) -> &str {
        "hold_reaper"
    }

    async fn run_once(&self) -> AppResult<usize> {
        self.reaper.run_once().await
    }
}
