//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use boxoffice_core::config::cache::RedisCacheConfig;
use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;

/// Redis client wrapper with connection management and key prefixing.
#[derive(Debug, Clone)]
pub struct RedisClient {
    /// Redis connection manager (pooled, reconnecting).
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
    /// COUNT hint for SCAN.
    scan_count: usize,
}

impl RedisClient {
    /// Create a new Redis client from configuration.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        info!(url = %redact_redis_url(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to connect to Redis", e)
        })?;

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            scan_count: config.scan_count,
        })
    }

    /// Get a mutable clone of the connection manager.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Strip the configured prefix from a key returned by Redis.
    pub fn unprefixed_key<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.key_prefix.as_str()).unwrap_or(key)
    }

    /// COUNT hint for SCAN.
    pub fn scan_count(&self) -> usize {
        self.scan_count
    }
}

/// Hide the password in a Redis URL for safe logging.
fn redact_redis_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://****@{host}"),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
