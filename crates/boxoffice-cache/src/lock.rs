//! Distributed locks built on the lease cache's conditional writes.
//!
//! A lock is a cache key whose value is the holder token. Acquisition is
//! `set_nx`; release is compare-and-delete, so a holder whose lock already
//! expired can never delete a successor's lock. There is no wait queue:
//! a taken lock reports [`LockOutcome::Busy`] immediately.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};
use uuid::Uuid;

use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;

/// Result of running an action under one or more locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome<T> {
    /// Every lock was acquired and the action ran to completion.
    Completed(T),
    /// At least one lock was held by someone else; the action did not run.
    Busy,
}

impl<T> LockOutcome<T> {
    /// Whether the locks were busy.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// The action's value, if it ran.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Busy => None,
        }
    }
}

/// Mutual exclusion over lease cache keys.
#[derive(Debug, Clone)]
pub struct LockManager {
    cache: Arc<dyn CacheProvider>,
}

impl LockManager {
    /// Create a lock manager over a cache provider.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Generate a fresh holder token.
    pub fn new_holder() -> String {
        Uuid::new_v4().to_string()
    }

    /// Try to take `key` for `holder`. Succeeds only if the key is free.
    pub async fn acquire(&self, key: &str, holder: &str, ttl: Duration) -> AppResult<bool> {
        self.cache.set_nx(key, holder, ttl).await
    }

    /// Release `key` if, and only if, `holder` still owns it.
    pub async fn release(&self, key: &str, holder: &str) -> AppResult<bool> {
        self.cache.delete_if_eq(key, holder).await
    }

    /// Remove a lock regardless of its holder.
    pub async fn force_release(&self, key: &str) -> AppResult<()> {
        self.cache.delete(key).await
    }

    /// Run `action` while holding `key`.
    ///
    /// The lock is released after the action succeeds, fails, or panics,
    /// and when the returned future is dropped mid-flight.
    pub async fn with_lock<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        action: F,
    ) -> AppResult<LockOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.with_locks(&[key.to_string()], ttl, action).await
    }

    /// Run `action` while holding every key in `keys`.
    ///
    /// Keys are acquired in sorted order. If any key is taken, the keys
    /// already acquired are released and `Busy` is returned.
    pub async fn with_locks<T, F, Fut>(
        &self,
        keys: &[String],
        ttl: Duration,
        action: F,
    ) -> AppResult<LockOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut ordered = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut held = HeldLocks::new(Arc::clone(&self.cache), Self::new_holder());
        for key in ordered {
            match self.acquire(&key, &held.holder, ttl).await {
                Ok(true) => held.keys.push(key),
                Ok(false) => {
                    debug!(key = %key, "Lock busy");
                    held.release().await;
                    return Ok(LockOutcome::Busy);
                }
                Err(e) => {
                    held.release().await;
                    return Err(e);
                }
            }
        }

        let result = AssertUnwindSafe(action()).catch_unwind().await;
        held.release().await;

        match result {
            Ok(value) => value.map(LockOutcome::Completed),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Locks taken by one `with_locks` call.
struct HeldLocks {
    cache: Arc<dyn CacheProvider>,
    holder: String,
    keys: Vec<String>,
    armed: bool,
}

impl HeldLocks {
    fn new(cache: Arc<dyn CacheProvider>, holder: String) -> Self {
        Self {
            cache,
            holder,
            keys: Vec::new(),
            armed: true,
        }
    }

    async fn release(mut self) {
        self.armed = false;
        release_all(self.cache.as_ref(), &self.keys, &self.holder).await;
    }
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        if !self.armed || self.keys.is_empty() {
            return;
        }
        // Cancelled mid-action: finish the release on the runtime.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(keys = ?self.keys, "No runtime to release locks; they will expire by TTL");
            return;
        };
        let cache = Arc::clone(&self.cache);
        let holder = std::mem::take(&mut self.holder);
        let keys = std::mem::take(&mut self.keys);
        handle.spawn(async move {
            release_all(cache.as_ref(), &keys, &holder).await;
        });
    }
}

async fn release_all(cache: &dyn CacheProvider, keys: &[String], holder: &str) {
    for key in keys.iter().rev() {
        match cache.delete_if_eq(key, holder).await {
            Ok(true) => {}
            Ok(false) => warn!(key = %key, "Lock expired before release"),
            Err(e) => warn!(key = %key, error = %e, "Failed to release lock"),
        }
    }
}
