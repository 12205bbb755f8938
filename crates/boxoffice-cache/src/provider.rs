//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use boxoffice_core::config::cache::CacheConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
    default_ttl: Duration,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self {
            inner,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self {
            inner: provider,
            default_ttl: Duration::from_secs(300),
        }
    }

    /// Shared handle to the inner provider.
    pub fn provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.inner)
    }

    /// TTL used when a caller has no better lifetime for an entry.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn delete_if_eq(&self, key: &str, expected: &str) -> AppResult<bool> {
        self.inner.delete_if_eq(key, expected).await
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.scan_prefix(prefix).await
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        self.inner.incr(key).await
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        self.inner.decr(key).await
    }

    async fn list_push(&self, key: &str, value: &str) -> AppResult<u64> {
        self.inner.list_push(key, value).await
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        self.inner.list_len(key).await
    }

    async fn list_drain_and_flag(
        &self,
        list_key: &str,
        count: usize,
        flag_prefix: &str,
        flag_value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<String>> {
        self.inner
            .list_drain_and_flag(list_key, count, flag_prefix, flag_value, ttl)
            .await
    }

    async fn window_claim(&self, key: &str, limit: u64, ttl: Duration) -> AppResult<bool> {
        self.inner.window_claim(key, limit, ttl).await
    }

    async fn window_add(&self, key: &str, count: u64, ttl: Duration) -> AppResult<()> {
        self.inner.window_add(key, count, ttl).await
    }

    async fn window_len(&self, key: &str) -> AppResult<u64> {
        self.inner.window_len(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.inner.flush_all().await
    }
}
