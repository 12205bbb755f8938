//! Periodic runner: drives a [`PeriodicJob`] until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::jobs::PeriodicJob;

/// Runs one job at a fixed interval until the shutdown signal flips to
/// `true`.
#[derive(Debug, Clone)]
pub struct PeriodicRunner {
    job: Arc<dyn PeriodicJob>,
    interval: Duration,
}

impl PeriodicRunner {
    /// Create a runner for `job`.
    pub fn new(job: Arc<dyn PeriodicJob>, interval: Duration) -> Self {
        Self { job, interval }
    }

    /// Run until `shutdown` reports `true` or its sender is dropped.
    ///
    /// The first run happens one interval after start. A failed run is
    /// logged and the next run proceeds on schedule.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            job = self.job.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Periodic job started"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.job.run_once().await {
                        Ok(count) => debug!(job = self.job.name(), count, "Periodic job ran"),
                        Err(e) => error!(job = self.job.name(), error = %e, "Periodic job failed"),
                    }
                }
            }
        }

        info!(job = self.job.name(), "Periodic job stopped");
    }

    /// Spawn the runner onto the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use boxoffice_core::error::AppError;
    use boxoffice_core::result::AppResult;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingJob {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PeriodicJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run_once(&self) -> AppResult<usize> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::cache("unreachable"));
            }
            Ok(1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_each_interval_until_shutdown() {
        let job = Arc::new(CountingJob::default());
        let (tx, rx) = watch::channel(false);
        let handle = PeriodicRunner::new(job.clone(), Duration::from_secs(2)).spawn(rx);

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_runner() {
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let (tx, rx) = watch::channel(false);
        let handle = PeriodicRunner::new(job.clone(), Duration::from_secs(1)).spawn(rx);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 3);

        drop(tx);
        handle.await.unwrap();
    }
}
