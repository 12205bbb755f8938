//! In-memory cache implementation using the moka crate.
//!
//! Leases carry their own TTL. moka evicts them on its own clock; reads
//! additionally check a `tokio::time::Instant` deadline so expiry follows
//! the runtime clock (and paused time in tests). The cache is unbounded:
//! a live lock or ready flag is never evicted to make room.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use boxoffice_core::config::cache::MemoryCacheConfig;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;

/// A cached value with its own deadline.
#[derive(Debug, Clone)]
struct Lease {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

impl Lease {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            ttl,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Per-entry expiry policy: every lease lives for its own TTL.
struct LeaseExpiry;

impl Expiry<String, Lease> for LeaseExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Lease,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Lease,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// Leases keyed by unprefixed key.
    cache: Cache<String, Lease>,
    /// Counters stored separately for atomic incr/decr.
    counters: Arc<DashMap<String, AtomicI64>>,
    /// FIFO lists; one mutex makes drain-and-flag a single critical section.
    lists: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    /// Expiring windows: slot deadlines, oldest first.
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .initial_capacity(config.initial_capacity)
            .expire_after(LeaseExpiry)
            .build();

        Self {
            cache,
            counters: Arc::new(DashMap::new()),
            lists: Arc::new(Mutex::new(HashMap::new())),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn live(&self, key: &str) -> Option<Lease> {
        self.cache.get(key).await.filter(Lease::is_live)
    }
}

/// Drop the expired slots at the front of a window.
fn prune(window: &mut VecDeque<Instant>, now: Instant) {
    while window.front().is_some_and(|deadline| *deadline <= now) {
        window.pop_front();
    }
}

/// Insert a slot keeping the window sorted by deadline.
fn insert_slot(window: &mut VecDeque<Instant>, deadline: Instant) {
    let at = window.partition_point(|existing| *existing <= deadline);
    window.insert(at, deadline);
}

impl Default for MemoryCacheProvider {
    fn default() -> Self {
        Self::new(&MemoryCacheConfig::default())
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(lease) = self.live(key).await {
            return Ok(Some(lease.value));
        }
        Ok(self
            .counters
            .get(key)
            .map(|counter| counter.load(Ordering::SeqCst).to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(key.to_string(), Lease::new(value, ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        self.lists.lock().await.remove(key);
        self.windows.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live(key).await.is_some() || self.counters.contains_key(key))
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let lease = Lease::new(value, ttl);
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| async move {
                match current {
                    Some(entry) if entry.value().is_live() => Op::Nop,
                    _ => Op::Put(lease),
                }
            })
            .await;
        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn delete_if_eq(&self, key: &str, expected: &str) -> AppResult<bool> {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| async move {
                match current {
                    Some(entry) if entry.value().is_live() && entry.value().value == expected => {
                        Op::Remove
                    }
                    _ => Op::Nop,
                }
            })
            .await;
        Ok(matches!(result, CompResult::Removed(_)))
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, lease)| key.starts_with(prefix) && lease.is_live())
            .map(|(key, _)| key.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(0));
        Ok(entry.value().fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(0));
        Ok(entry.value().fetch_sub(1, Ordering::SeqCst) - 1)
    }

    async fn list_push(&self, key: &str, value: &str) -> AppResult<u64> {
        let mut lists = self.lists.lock().await;
        let list = lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        let lists = self.lists.lock().await;
        Ok(lists.get(key).map_or(0, |list| list.len() as u64))
    }

    async fn list_drain_and_flag(
        &self,
        list_key: &str,
        count: usize,
        flag_prefix: &str,
        flag_value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<String>> {
        let mut lists = self.lists.lock().await;
        let Some(list) = lists.get_mut(list_key) else {
            return Ok(Vec::new());
        };

        let take = count.min(list.len());
        let drained: Vec<String> = list.drain(..take).collect();
        if list.is_empty() {
            lists.remove(list_key);
        }

        for entry in &drained {
            self.cache
                .insert(format!("{flag_prefix}{entry}"), Lease::new(flag_value, ttl))
                .await;
        }

        debug!(list_key, drained = drained.len(), "Drained list entries");
        Ok(drained)
    }

    async fn window_claim(&self, key: &str, limit: u64, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_default();
        prune(window, now);
        if window.len() as u64 >= limit {
            return Ok(false);
        }
        insert_slot(window, now + ttl);
        Ok(true)
    }

    async fn window_add(&self, key: &str, count: u64, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_default();
        prune(window, now);
        for _ in 0..count {
            insert_slot(window, now + ttl);
        }
        Ok(())
    }

    async fn window_len(&self, key: &str) -> AppResult<u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let Some(window) = windows.get_mut(key) else {
            return Ok(0);
        };
        prune(window, now);
        Ok(window.len() as u64)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        self.counters.clear();
        self.lists.lock().await.clear();
        self.windows.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            initial_capacity: 64,
        })
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let provider = make_provider();
        provider
            .set("seat:1:1", "RESERVED", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            provider.get("seat:1:1").await.unwrap(),
            Some("RESERVED".to_string())
        );
        provider.delete("seat:1:1").await.unwrap();
        assert_eq!(provider.get("seat:1:1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_with_runtime_clock() {
        let provider = make_provider();
        provider
            .set("short", "v", Duration::from_secs(5))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(provider.get("short").await.unwrap(), None);
        assert!(provider.scan_prefix("sh").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_nx_only_first_wins() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        assert!(provider.set_nx("nx", "a", ttl).await.unwrap());
        assert!(!provider.set_nx("nx", "b", ttl).await.unwrap());
        assert_eq!(provider.get("nx").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_nx_replaces_expired_entry() {
        let provider = make_provider();
        assert!(provider.set_nx("nx", "a", Duration::from_secs(1)).await.unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(provider.set_nx("nx", "b", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_set_nx_has_single_winner() {
        let provider = make_provider();
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let provider = provider.clone();
                tokio::spawn(async move {
                    provider
                        .set_nx("race", &i.to_string(), Duration::from_secs(60))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_delete_if_eq_checks_value() {
        let provider = make_provider();
        provider
            .set("lock", "holder-a", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!provider.delete_if_eq("lock", "holder-b").await.unwrap());
        assert!(provider.exists("lock").await.unwrap());
        assert!(provider.delete_if_eq("lock", "holder-a").await.unwrap());
        assert!(!provider.exists("lock").await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.set("seat:1:1", "RESERVED", ttl).await.unwrap();
        provider.set("seat:1:2", "RESERVED", ttl).await.unwrap();
        provider.set("seat:2:1", "RESERVED", ttl).await.unwrap();
        let keys = provider.scan_prefix("seat:1:").await.unwrap();
        assert_eq!(keys, vec!["seat:1:1".to_string(), "seat:1:2".to_string()]);
    }

    #[tokio::test]
    async fn test_incr_decr() {
        let provider = make_provider();
        assert_eq!(provider.incr("counter").await.unwrap(), 1);
        assert_eq!(provider.incr("counter").await.unwrap(), 2);
        assert_eq!(provider.decr("counter").await.unwrap(), 1);
        assert_eq!(provider.get("counter").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_list_drain_and_flag_is_fifo() {
        let provider = make_provider();
        for token in ["t1", "t2", "t3"] {
            provider.list_push("group:1", token).await.unwrap();
        }
        let drained = provider
            .list_drain_and_flag("group:1", 2, "ready:", "true", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(drained, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(provider.list_len("group:1").await.unwrap(), 1);
        assert!(provider.exists("ready:t1").await.unwrap());
        assert!(!provider.exists("ready:t3").await.unwrap());
    }

    #[tokio::test]
    async fn test_size_pressure_never_evicts_live_entries() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        assert!(provider.set_nx("seat:1:1:lock", "holder-a", ttl).await.unwrap());
        provider.set("queue:ready:t1", "true", ttl).await.unwrap();

        for i in 0..5000 {
            let key = format!("filler:{i}");
            provider.set(&key, "x", ttl).await.unwrap();
            provider.get(&key).await.unwrap();
        }
        provider.cache.run_pending_tasks().await;

        assert!(!provider.set_nx("seat:1:1:lock", "holder-b", ttl).await.unwrap());
        assert_eq!(
            provider.get("seat:1:1:lock").await.unwrap(),
            Some("holder-a".to_string())
        );
        assert!(provider.exists("queue:ready:t1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_claim_respects_limit_and_expiry() {
        let provider = make_provider();
        let ttl = Duration::from_secs(10);
        assert!(provider.window_claim("admitted", 2, ttl).await.unwrap());
        assert!(provider.window_claim("admitted", 2, ttl).await.unwrap());
        assert!(!provider.window_claim("admitted", 2, ttl).await.unwrap());
        assert_eq!(provider.window_len("admitted").await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(provider.window_len("admitted").await.unwrap(), 0);
        assert!(provider.window_claim("admitted", 2, ttl).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_add_counts_toward_limit() {
        let provider = make_provider();
        provider
            .window_add("admitted", 3, Duration::from_secs(30))
            .await
            .unwrap();
        assert!(
            !provider
                .window_claim("admitted", 3, Duration::from_secs(30))
                .await
                .unwrap()
        );

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(
            provider
                .window_claim("admitted", 3, Duration::from_secs(30))
                .await
                .unwrap()
        );
        assert_eq!(provider.window_len("admitted").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let provider = make_provider();
        let data = serde_json::json!({"date": "2025-01-01", "total": 42});
        provider
            .set_json("stats", &data, Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<serde_json::Value> = provider.get_json("stats").await.unwrap();
        assert_eq!(result, Some(data));
    }
}
