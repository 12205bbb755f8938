//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Lua script for compare-and-delete.
///
/// KEYS[1] = key
/// ARGV[1] = expected value
///
/// Returns 1 when the key held the expected value and was deleted, else 0.
const DELETE_IF_EQ_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end
    return 0
"#;

/// Lua script for atomic pop-and-flag.
///
/// KEYS[1] = list key
/// ARGV[1] = max entries to pop
/// ARGV[2] = flag key prefix (already prefixed)
/// ARGV[3] = flag value
/// ARGV[4] = flag TTL in seconds
///
/// Returns the popped entries in FIFO order.
const DRAIN_AND_FLAG_SCRIPT: &str = r#"
    local items = redis.call('LRANGE', KEYS[1], 0, tonumber(ARGV[1]) - 1)
    if #items > 0 then
        redis.call('LTRIM', KEYS[1], #items, -1)
    end
    for _, item in ipairs(items) do
        redis.call('SET', ARGV[2] .. item, ARGV[3], 'EX', tonumber(ARGV[4]))
    end
    return items
"#;

/// Lua script for adding slots to an expiring window.
///
/// The window is a sorted set scored by each slot's deadline in
/// milliseconds of server time.
///
/// KEYS[1] = window key
/// KEYS[2] = member sequence key
/// ARGV[1] = slot limit, or -1 for none
/// ARGV[2] = slots to add
/// ARGV[3] = slot TTL in milliseconds
///
/// Returns 1 when the slots were added, else 0.
const WINDOW_ADD_SCRIPT: &str = r#"
    local t = redis.call('TIME')
    local now = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)
    redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now)
    local limit = tonumber(ARGV[1])
    local count = tonumber(ARGV[2])
    if limit >= 0 and redis.call('ZCARD', KEYS[1]) + count > limit then
        return 0
    end
    local deadline = now + tonumber(ARGV[3])
    for _ = 1, count do
        local member = redis.call('INCR', KEYS[2])
        redis.call('ZADD', KEYS[1], deadline, member)
    end
    local last = redis.call('ZRANGE', KEYS[1], -1, -1, 'WITHSCORES')
    if #last == 2 then
        local remaining = tonumber(last[2]) - now
        redis.call('PEXPIRE', KEYS[1], remaining)
        redis.call('PEXPIRE', KEYS[2], remaining)
    end
    return 1
"#;

/// Lua script for counting live window slots.
///
/// KEYS[1] = window key
const WINDOW_LEN_SCRIPT: &str = r#"
    local t = redis.call('TIME')
    local now = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)
    redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now)
    return redis.call('ZCARD', KEYS[1])
"#;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    /// Redis rejects `EX 0`; sub-second TTLs round up to one second.
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }

    /// SCAN every full key matching `pattern`.
    async fn scan(&self, pattern: &str) -> AppResult<Vec<String>> {
        let mut conn = self.client.conn_mut();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.client.scan_count())
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn window_insert(
        &self,
        key: &str,
        limit: Option<u64>,
        count: u64,
        ttl: Duration,
    ) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let limit = limit.map_or(-1, |limit| limit.min(i64::MAX as u64) as i64);
        let added: i64 = redis::Script::new(WINDOW_ADD_SCRIPT)
            .key(&full_key)
            .key(format!("{full_key}:seq"))
            .arg(limit)
            .arg(count)
            .arg(ttl.as_millis().max(1) as u64)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(added == 1)
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(&full_key, value, Self::ttl_secs(ttl))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // SET key value EX ttl NX
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("EX")
            .arg(Self::ttl_secs(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn delete_if_eq(&self, key: &str, expected: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let deleted: i64 = redis::Script::new(DELETE_IF_EQ_SCRIPT)
            .key(&full_key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(deleted == 1)
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let pattern = format!("{}*", self.client.prefixed_key(prefix));
        let mut keys: Vec<String> = self
            .scan(&pattern)
            .await?
            .iter()
            .map(|key| self.client.unprefixed_key(key).to_string())
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: i64 = conn.incr(&full_key, 1i64).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: i64 = conn.decr(&full_key, 1i64).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn list_push(&self, key: &str, value: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = conn.rpush(&full_key, value).await.map_err(Self::map_err)?;
        Ok(len)
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = conn.llen(&full_key).await.map_err(Self::map_err)?;
        Ok(len)
    }

    async fn list_drain_and_flag(
        &self,
        list_key: &str,
        count: usize,
        flag_prefix: &str,
        flag_value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let full_key = self.client.prefixed_key(list_key);
        let mut conn = self.client.conn_mut();
        let drained: Vec<String> = redis::Script::new(DRAIN_AND_FLAG_SCRIPT)
            .key(&full_key)
            .arg(count)
            .arg(self.client.prefixed_key(flag_prefix))
            .arg(flag_value)
            .arg(Self::ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        debug!(list_key, drained = drained.len(), "Drained list entries");
        Ok(drained)
    }

    async fn window_claim(&self, key: &str, limit: u64, ttl: Duration) -> AppResult<bool> {
        self.window_insert(key, Some(limit), 1, ttl).await
    }

    async fn window_add(&self, key: &str, count: u64, ttl: Duration) -> AppResult<()> {
        if count == 0 {
            return Ok(());
        }
        self.window_insert(key, None, count, ttl).await?;
        Ok(())
    }

    async fn window_len(&self, key: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = redis::Script::new(WINDOW_LEN_SCRIPT)
            .key(&full_key)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(len)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    async fn flush_all(&self) -> AppResult<()> {
        // Only flush keys with our prefix, not the entire Redis.
        let keys = self.scan(&self.client.prefixed_key("*")).await?;
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&keys).await.map_err(Self::map_err)?;
        debug!(count = keys.len(), "Flushed prefixed keys");
        Ok(())
    }
}
