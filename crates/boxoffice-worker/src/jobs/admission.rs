//! Admission tick job.

use std::sync::Arc;

use async_trait::async_trait;

use boxoffice_core::result::AppResult;
use boxoffice_queue::AdmissionController;

use super::PeriodicJob;

/// Promotes one batch from every active shard per run.
#[derive(Debug, Clone)]
pub struct AdmissionTicker {
    controller: Arc<AdmissionController>,
}

impl AdmissionTicker {
    /// Create the job.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl PeriodicJob for AdmissionTicker {
    fn name(&self) -> &str {
        "admission_tick"
    }

    async fn run_once(&self) -> AppResult<usize> {
        self.controller.tick().await
    }
}
