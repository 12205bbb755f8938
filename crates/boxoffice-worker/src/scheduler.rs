//! Cron scheduler for calendar-based tasks.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use boxoffice_core::error::AppError;
use boxoffice_queue::AdmissionController;

/// Cron-based scheduler for calendar-driven background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Waiting room whose statistics are snapshotted
    queue: Arc<AdmissionController>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(queue: Arc<AdmissionController>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, queue })
    }

    /// Register the daily queue statistics snapshot at `expression`
    /// (six-field cron, seconds first).
    pub async fn register_daily_stats(&self, expression: &str) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async(expression, move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                let today = Utc::now().date_naive();
                if let Err(e) = queue.record_daily_stats(today).await {
                    tracing::error!(date = %today, error = %e, "Failed to record daily queue statistics");
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create daily_stats schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add daily_stats schedule: {}", e))
        })?;

        tracing::info!(cron = %expression, "Registered: daily_stats");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxoffice_cache::CacheManager;
    use boxoffice_cache::memory::MemoryCacheProvider;
    use boxoffice_core::config::{QueueConfig, RealtimeConfig};
    use boxoffice_realtime::{MemoryPubSub, Notifier};

    use super::*;

    fn controller() -> Arc<AdmissionController> {
        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::default()));
        let notifier = Notifier::new(Arc::new(MemoryPubSub::new(8)), &RealtimeConfig::default());
        Arc::new(AdmissionController::new(
            cache,
            notifier,
            &QueueConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_rejects_invalid_expression() {
        let scheduler = CronScheduler::new(controller()).await.unwrap();
        let err = scheduler.register_daily_stats("not a cron").await.unwrap_err();
        assert_eq!(err.kind, boxoffice_core::error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_registers_daily_stats() {
        let scheduler = CronScheduler::new(controller()).await.unwrap();
        scheduler.register_daily_stats("0 0 0 * * *").await.unwrap();
    }
}
