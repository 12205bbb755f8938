//! Bounded worker pool.
//!
//! A fixed number of worker tasks pull work from a bounded queue. When the
//! queue is full the submitting caller runs the work itself, which slows the
//! producer down instead of growing an unbounded backlog.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, info};

use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;

type Task = BoxFuture<'static, ()>;

/// Fixed-size pool of async workers fed by a bounded queue.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<Task>,
    concurrency: usize,
    capacity: usize,
}

impl WorkerPool {
    /// Spawn `concurrency` workers sharing a queue of `queue_capacity`
    /// slots. Must be called from within a Tokio runtime.
    pub fn new(concurrency: usize, queue_capacity: usize) -> Self {
        let concurrency = concurrency.max(1);
        let capacity = queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel::<Task>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..concurrency {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                loop {
                    let task = { receiver.lock().await.recv().await };
                    let Some(task) = task else {
                        break;
                    };
                    if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                        error!(worker_id, "Pool task panicked");
                    }
                }
                debug!(worker_id, "Pool worker stopped");
            });
        }

        info!(concurrency, queue_capacity = capacity, "Worker pool started");
        Self {
            sender,
            concurrency,
            capacity,
        }
    }

    /// Number of worker tasks.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Run `future` on the pool and wait for its output.
    ///
    /// Runs on the caller when the queue is full.
    pub async fn run<F, T>(&self, future: F) -> AppResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task = Box::pin(async move {
            let _ = tx.send(future.await);
        });

        match self.sender.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(task)) => {
                debug!(queued = self.capacity, "Worker pool saturated, running on caller");
                task.await;
            }
            Err(TrySendError::Closed(_)) => {
                return Err(AppError::service_unavailable("Worker pool is shut down"));
            }
        }

        rx.await
            .map_err(|_| AppError::internal("Pool task ended without producing a result"))
    }
}
