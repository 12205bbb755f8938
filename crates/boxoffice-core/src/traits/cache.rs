//! Lease cache provider trait for pluggable caching backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for lease cache backends (Redis or in-memory).
///
/// Values are plain strings. The provider is responsible for key prefixing
/// and TTL enforcement. Every conditional operation (`set_nx`,
/// `delete_if_eq`, `list_drain_and_flag`, `window_claim`) must be atomic
/// with respect to every other caller of the same backend. Live entries are
/// only ever removed by their TTL or an explicit delete, never by size
/// pressure.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists in the cache.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Set a value only if the key does not already exist (NX).
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete a key only if its current value equals `expected`.
    /// Returns `true` if the key was deleted.
    async fn delete_if_eq(&self, key: &str, expected: &str) -> AppResult<bool>;

    /// List every live key starting with `prefix` (unprefixed form).
    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Increment an integer value by 1. Returns the new value.
    async fn incr(&self, key: &str) -> AppResult<i64>;

    /// Decrement an integer value by 1. Returns the new value.
    async fn decr(&self, key: &str) -> AppResult<i64>;

    /// Append a value to the tail of a list. Returns the new length.
    async fn list_push(&self, key: &str, value: &str) -> AppResult<u64>;

    /// Length of a list; zero when absent.
    async fn list_len(&self, key: &str) -> AppResult<u64>;

    /// Atomically pop up to `count` entries from the head of `list_key` and
    /// write `{flag_prefix}{entry} = flag_value` with `ttl` for each popped
    /// entry. Returns the popped entries in FIFO order.
    async fn list_drain_and_flag(
        &self,
        list_key: &str,
        count: usize,
        flag_prefix: &str,
        flag_value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<String>>;

    /// Claim one slot of the expiring window `key` when fewer than `limit`
    /// slots are live. A claimed slot lives for `ttl`. Returns `true` when
    /// the slot was claimed.
    async fn window_claim(&self, key: &str, limit: u64, ttl: Duration) -> AppResult<bool>;

    /// Add `count` slots to the expiring window `key` regardless of its size.
    async fn window_add(&self, key: &str, count: u64, ttl: Duration) -> AppResult<()>;

    /// Number of live slots in the expiring window `key`.
    async fn window_len(&self, key: &str) -> AppResult<u64>;

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Flush all entries from the cache.
    async fn flush_all(&self) -> AppResult<()>;
}
