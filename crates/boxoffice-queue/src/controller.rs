//! Queue admission controller.
//!
//! Arrival order comes from a shared sequence counter, so every instance
//! agrees on which shard a visitor lands in. Promotion of a shard runs under
//! that shard's lock and pops plus flags a batch in one atomic cache step.

use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use boxoffice_cache::{CacheManager, LockManager, LockOutcome, QueueKeys};
use boxoffice_core::config::QueueConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;
use boxoffice_entity::queue::{AdmissionStatus, QueueStats, QueueToken};
use boxoffice_realtime::Notifier;

const READY_FLAG: &str = "true";
const WAITING_PENDING: &str = "pending";
const WAITING_MARKER_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_TOKEN_LEN: usize = 128;
const DAILY_STATS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Shard a 1-based arrival slot falls into.
fn shard_for(slot: i64, capacity: u64) -> u64 {
    let slot = slot.max(1) as u64;
    (slot - 1) / capacity.max(1) + 1
}

/// Bounds the rate at which waiting visitors reach the reservation engine.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    cache: CacheManager,
    locks: LockManager,
    notifier: Notifier,
    keys: QueueKeys,
    config: QueueConfig,
}

impl AdmissionController {
    /// Create a controller over the shared cache.
    pub fn new(cache: CacheManager, notifier: Notifier, config: &QueueConfig) -> Self {
        Self {
            locks: LockManager::new(cache.provider()),
            cache,
            notifier,
            keys: QueueKeys::new(config.namespace.clone()),
            config: config.clone(),
        }
    }

    /// Key builder of this waiting room.
    pub fn keys(&self) -> &QueueKeys {
        &self.keys
    }

    /// Admit or queue a visitor. A missing or blank token is replaced by a
    /// freshly generated one.
    pub async fn enqueue(&self, token: Option<String>) -> AppResult<QueueToken> {
        let token = match token.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => Uuid::new_v4().to_string(),
        };
        if token.len() > MAX_TOKEN_LEN {
            return Err(AppError::validation(format!(
                "Queue token must be at most {MAX_TOKEN_LEN} characters"
            )));
        }

        if self.is_ready(&token).await? {
            return Ok(QueueToken::ready(token));
        }

        if self.cache.exists(&self.keys.vip(&token)).await? {
            self.mark_ready(&token).await?;
            self.cache
                .window_add(&self.keys.admitted(), 1, self.config.ready_ttl())
                .await?;
            info!(token = %token, "Privileged token admitted");
            return Ok(QueueToken::ready(token));
        }

        if let Some(ticket) = self.queued_ticket(&token).await? {
            debug!(token = %token, "Token already waiting");
            return Ok(ticket);
        }

        if self.try_fast_path().await? {
            self.mark_ready(&token).await?;
            debug!(token = %token, "Token admitted through fast path");
            return Ok(QueueToken::ready(token));
        }

        // Claim the waiting marker before taking an arrival slot; a slot
        // taken without a push would keep its shard from ever retiring.
        let marker = self.keys.waiting(&token);
        if !self
            .cache
            .set_nx(&marker, WAITING_PENDING, WAITING_MARKER_TTL)
            .await?
        {
            let ticket = match self.queued_ticket(&token).await? {
                Some(ticket) => ticket,
                None => QueueToken::waiting(token, self.tail_shard().await?.max(1)),
            };
            return Ok(ticket);
        }

        let slot = self.cache.incr(&self.keys.sequence()).await?;
        let shard = shard_for(slot, self.config.shard_capacity);
        self.cache.list_push(&self.keys.group(shard), &token).await?;
        self.cache.incr(&self.keys.group_pushed(shard)).await?;
        self.cache
            .set(&marker, &shard.to_string(), WAITING_MARKER_TTL)
            .await?;

        debug!(token = %token, shard, slot, "Token queued");
        Ok(QueueToken::waiting(token, shard))
    }

    /// Whether `token` has been promoted and its ready flag is still live.
    pub async fn is_ready(&self, token: &str) -> AppResult<bool> {
        self.cache.exists(&self.keys.ready(token)).await
    }

    /// Admission status of `token`.
    pub async fn status(&self, token: &str) -> AppResult<AdmissionStatus> {
        Ok(AdmissionStatus::from_ready(self.is_ready(token).await?))
    }

    /// Let `token` skip the queue on its next enqueue, for `ttl`.
    pub async fn grant_priority(&self, token: &str, ttl: Duration) -> AppResult<()> {
        self.cache.set(&self.keys.vip(token), "1", ttl).await?;
        info!(token = %token, ttl_secs = ttl.as_secs(), "Priority granted");
        Ok(())
    }

    /// Promote up to one batch from `shard`.
    ///
    /// Returns the number of tokens promoted; a shard whose lock is held by
    /// another instance is skipped and reports zero.
    pub async fn process_shard(&self, shard: u64) -> AppResult<usize> {
        let outcome = self
            .locks
            .with_lock(
                &self.keys.group_lock(shard),
                self.config.shard_lock_ttl(),
                || async move {
                    let promoted = self
                        .cache
                        .list_drain_and_flag(
                            &self.keys.group(shard),
                            self.config.batch_size,
                            &self.keys.ready_prefix(),
                            READY_FLAG,
                            self.config.ready_ttl(),
                        )
                        .await?;
                    self.retire_if_drained(shard).await?;
                    Ok(promoted)
                },
            )
            .await?;

        let promoted = match outcome {
            LockOutcome::Completed(promoted) => promoted,
            LockOutcome::Busy => {
                debug!(shard, "Shard busy on another instance");
                return Ok(0);
            }
        };

        if !promoted.is_empty() {
            self.cache
                .window_add(
                    &self.keys.admitted(),
                    promoted.len() as u64,
                    self.config.ready_ttl(),
                )
                .await?;
        }
        for token in &promoted {
            self.cache.delete(&self.keys.waiting(token)).await?;
            self.notifier.queue_admitted(token, Some(shard)).await;
        }
        if !promoted.is_empty() {
            info!(shard, count = promoted.len(), "Shard batch promoted");
        }
        Ok(promoted.len())
    }

    /// Process every active shard concurrently. Returns the total number of
    /// tokens promoted.
    pub async fn tick(&self) -> AppResult<usize> {
        let head = self.head_shard().await?;
        let tail = self.tail_shard().await?;
        if tail < head {
            return Ok(0);
        }

        let results = join_all((head..=tail).map(|shard| self.process_shard(shard))).await;
        let mut total = 0;
        for (shard, result) in (head..=tail).zip(results) {
            match result {
                Ok(count) => total += count,
                Err(e) => warn!(shard, error = %e, "Failed to process shard"),
            }
        }
        Ok(total)
    }

    /// Snapshot of the waiting room.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let enqueued_total = self.counter(&self.keys.sequence()).await?.max(0) as u64;
        let admitted_live = self.cache.window_len(&self.keys.admitted()).await?;
        let head_shard = self.head_shard().await?;
        let tail_shard = self.tail_shard().await?;

        let mut waiting = 0;
        for shard in head_shard..=tail_shard {
            waiting += self.cache.list_len(&self.keys.group(shard)).await?;
        }

        Ok(QueueStats {
            enqueued_total,
            admitted_live,
            head_shard,
            tail_shard,
            waiting,
        })
    }

    /// Store today's snapshot under the daily statistics key.
    pub async fn record_daily_stats(&self, date: NaiveDate) -> AppResult<QueueStats> {
        let stats = self.stats().await?;
        let key = self.keys.daily_stats(&date.to_string());
        self.cache.set_json(&key, &stats, DAILY_STATS_TTL).await?;
        info!(
            date = %date,
            enqueued_total = stats.enqueued_total,
            waiting = stats.waiting,
            "Recorded daily queue statistics"
        );
        Ok(stats)
    }

    /// Snapshot recorded for `date`, if any.
    pub async fn daily_stats(&self, date: NaiveDate) -> AppResult<Option<QueueStats>> {
        self.cache
            .get_json(&self.keys.daily_stats(&date.to_string()))
            .await
    }

    async fn mark_ready(&self, token: &str) -> AppResult<()> {
        self.cache
            .set(&self.keys.ready(token), READY_FLAG, self.config.ready_ttl())
            .await
    }

    /// Waiting ticket of a token already sitting in a shard, if any.
    async fn queued_ticket(&self, token: &str) -> AppResult<Option<QueueToken>> {
        let Some(raw) = self.cache.get(&self.keys.waiting(token)).await? else {
            return Ok(None);
        };
        let shard = match raw.parse::<u64>() {
            Ok(shard) => shard,
            Err(_) => self.tail_shard().await?.max(1),
        };
        Ok(Some(QueueToken::waiting(token, shard)))
    }

    /// Claim a slot in the live admitted population while it is below the
    /// fast-path threshold. Slots lapse with the ready flag TTL.
    async fn try_fast_path(&self) -> AppResult<bool> {
        if self.config.fast_path_threshold <= 0 {
            return Ok(false);
        }
        self.cache
            .window_claim(
                &self.keys.admitted(),
                self.config.fast_path_threshold as u64,
                self.config.ready_ttl(),
            )
            .await
    }

    /// Retire the head shard once it is sealed and empty. Runs under the
    /// shard lock, so only one instance can retire a given shard.
    async fn retire_if_drained(&self, shard: u64) -> AppResult<()> {
        if shard != self.head_shard().await? {
            return Ok(());
        }
        let pushed = self.counter(&self.keys.group_pushed(shard)).await?;
        if (pushed.max(0) as u64) < self.config.shard_capacity {
            return Ok(());
        }
        if self.cache.list_len(&self.keys.group(shard)).await? > 0 {
            return Ok(());
        }
        self.cache.incr(&self.keys.head()).await?;
        debug!(shard, "Shard retired");
        Ok(())
    }

    async fn head_shard(&self) -> AppResult<u64> {
        let retired = self.counter(&self.keys.head()).await?.max(0) as u64;
        Ok(retired + 1)
    }

    async fn tail_shard(&self) -> AppResult<u64> {
        let slot = self.counter(&self.keys.sequence()).await?;
        if slot <= 0 {
            return Ok(0);
        }
        Ok(shard_for(slot, self.config.shard_capacity))
    }

    async fn counter(&self, key: &str) -> AppResult<i64> {
        match self.cache.get(key).await? {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::cache(format!("Counter '{key}' holds non-integer value"))),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use boxoffice_cache::memory::MemoryCacheProvider;
    use boxoffice_core::config::RealtimeConfig;
    use boxoffice_realtime::{MemoryPubSub, OutboundMessage};

    use super::*;

    fn config(capacity: u64, batch: usize, fast_path: i64) -> QueueConfig {
        QueueConfig {
            shard_capacity: capacity,
            batch_size: batch,
            fast_path_threshold: fast_path,
            ..QueueConfig::default()
        }
    }

    fn controller_with(config: QueueConfig) -> (AdmissionController, Arc<MemoryPubSub>) {
        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::default()));
        let pubsub = Arc::new(MemoryPubSub::new(256));
        let notifier = Notifier::new(pubsub.clone(), &RealtimeConfig::default());
        (AdmissionController::new(cache, notifier, &config), pubsub)
    }

    #[test]
    fn test_shard_for() {
        assert_eq!(shard_for(1, 3), 1);
        assert_eq!(shard_for(3, 3), 1);
        assert_eq!(shard_for(4, 3), 2);
        assert_eq!(shard_for(7, 3), 3);
        assert_eq!(shard_for(0, 3), 1);
    }

    #[tokio::test]
    async fn test_blank_token_is_generated() {
        let (queue, _) = controller_with(config(10, 10, 0));
        let ticket = queue.enqueue(Some("   ".to_string())).await.unwrap();
        assert!(Uuid::parse_str(&ticket.token).is_ok());
        assert_eq!(ticket.shard, Some(1));
    }

    #[tokio::test]
    async fn test_overlong_token_rejected() {
        let (queue, _) = controller_with(config(10, 10, 0));
        let err = queue.enqueue(Some("x".repeat(200))).await.unwrap_err();
        assert_eq!(err.kind, boxoffice_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_fast_path_admits_up_to_threshold() {
        let (queue, _) = controller_with(config(10, 10, 2));

        assert!(queue.enqueue(Some("a".into())).await.unwrap().is_ready());
        assert!(queue.enqueue(Some("b".into())).await.unwrap().is_ready());
        let third = queue.enqueue(Some("c".into())).await.unwrap();
        assert!(!third.is_ready());
        assert_eq!(third.shard, Some(1));

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.admitted_live, 2);
        assert_eq!(stats.enqueued_total, 1);
        assert_eq!(stats.waiting, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_path_reopens_after_ready_flags_expire() {
        let (queue, _) = controller_with(QueueConfig {
            ready_ttl_seconds: 10,
            ..config(10, 10, 2)
        });

        assert!(queue.enqueue(Some("a".into())).await.unwrap().is_ready());
        assert!(queue.enqueue(Some("b".into())).await.unwrap().is_ready());
        assert!(!queue.enqueue(Some("c".into())).await.unwrap().is_ready());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!queue.is_ready("a").await.unwrap());
        assert_eq!(queue.stats().await.unwrap().admitted_live, 0);

        assert!(queue.enqueue(Some("d".into())).await.unwrap().is_ready());
        assert_eq!(queue.stats().await.unwrap().admitted_live, 1);
    }

    #[tokio::test]
    async fn test_promoted_tokens_count_toward_fast_path() {
        let (queue, _) = controller_with(config(10, 10, 2));
        queue.enqueue(Some("a".into())).await.unwrap();
        queue.enqueue(Some("b".into())).await.unwrap();
        queue.enqueue(Some("c".into())).await.unwrap();

        assert_eq!(queue.tick().await.unwrap(), 1);
        assert_eq!(queue.stats().await.unwrap().admitted_live, 3);
        assert!(!queue.enqueue(Some("d".into())).await.unwrap().is_ready());
    }

    #[tokio::test]
    async fn test_waiting_token_is_not_queued_twice() {
        let (queue, _) = controller_with(config(10, 10, 0));
        let first = queue.enqueue(Some("a".into())).await.unwrap();
        let second = queue.enqueue(Some("a".into())).await.unwrap();

        assert_eq!(second.status, AdmissionStatus::Waiting);
        assert_eq!(second.shard, first.shard);
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.enqueued_total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_of_same_token_queues_once() {
        let (queue, _) = controller_with(config(10, 10, 0));
        let tickets = join_all((0..8).map(|_| queue.enqueue(Some("same".into())))).await;
        for ticket in tickets {
            assert_eq!(ticket.unwrap().shard, Some(1));
        }

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.enqueued_total, 1);
    }

    #[tokio::test]
    async fn test_promotion_clears_waiting_marker() {
        let (queue, _) = controller_with(config(2, 10, 0));
        queue.enqueue(Some("a".into())).await.unwrap();
        queue.tick().await.unwrap();

        assert!(queue.is_ready("a").await.unwrap());
        assert!(!queue.cache.exists(&queue.keys().waiting("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_privileged_token_skips_queue() {
        let (queue, _) = controller_with(config(10, 10, 0));
        queue
            .grant_priority("vip-1", Duration::from_secs(60))
            .await
            .unwrap();

        let ticket = queue.enqueue(Some("vip-1".into())).await.unwrap();
        assert!(ticket.is_ready());
        assert_eq!(queue.stats().await.unwrap().waiting, 0);
    }

    #[tokio::test]
    async fn test_ready_token_is_not_requeued() {
        let (queue, _) = controller_with(config(10, 10, 1));
        queue.enqueue(Some("early".into())).await.unwrap();
        let again = queue.enqueue(Some("early".into())).await.unwrap();
        assert!(again.is_ready());
        assert_eq!(queue.stats().await.unwrap().enqueued_total, 0);
    }

    #[tokio::test]
    async fn test_tokens_fill_shards_in_order() {
        let (queue, _) = controller_with(config(3, 10, 0));
        let mut shards = Vec::new();
        for i in 0..7 {
            let ticket = queue.enqueue(Some(format!("t{i}"))).await.unwrap();
            shards.push(ticket.shard.unwrap());
        }
        assert_eq!(shards, vec![1, 1, 1, 2, 2, 2, 3]);

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.head_shard, 1);
        assert_eq!(stats.tail_shard, 3);
        assert_eq!(stats.waiting, 7);
    }

    #[tokio::test]
    async fn test_process_shard_promotes_oldest_batch() {
        let (queue, pubsub) = controller_with(config(10, 2, 0));
        let mut rx = pubsub.subscribe("queue.admitted").await;
        for token in ["a", "b", "c"] {
            queue.enqueue(Some(token.into())).await.unwrap();
        }

        assert_eq!(queue.process_shard(1).await.unwrap(), 2);
        assert!(queue.is_ready("a").await.unwrap());
        assert!(queue.is_ready("b").await.unwrap());
        assert_eq!(queue.status("c").await.unwrap(), AdmissionStatus::Waiting);

        for expected in ["a", "b"] {
            match rx.recv().await.unwrap() {
                OutboundMessage::QueueAdmitted { token, shard, .. } => {
                    assert_eq!(token, expected);
                    assert_eq!(shard, Some(1));
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_busy_shard_is_skipped() {
        let (queue, _) = controller_with(config(10, 10, 0));
        queue.enqueue(Some("a".into())).await.unwrap();

        let locks = LockManager::new(queue.cache.provider());
        assert!(
            locks
                .acquire(&queue.keys().group_lock(1), "other", Duration::from_secs(5))
                .await
                .unwrap()
        );

        assert_eq!(queue.process_shard(1).await.unwrap(), 0);
        assert!(!queue.is_ready("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_tick_drains_all_shards_and_retires_head() {
        let (queue, _) = controller_with(config(2, 10, 0));
        for i in 0..5 {
            queue.enqueue(Some(format!("t{i}"))).await.unwrap();
        }

        assert_eq!(queue.tick().await.unwrap(), 5);
        assert_eq!(queue.stats().await.unwrap().waiting, 0);

        // Shards 1 and 2 are sealed and empty; shard 3 still has room.
        assert_eq!(queue.tick().await.unwrap(), 0);
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.head_shard, 3);
        assert_eq!(stats.tail_shard, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_flag_lasts_until_ttl() {
        let (queue, _) = controller_with(QueueConfig {
            ready_ttl_seconds: 60,
            ..config(10, 10, 0)
        });
        queue.enqueue(Some("a".into())).await.unwrap();
        queue.tick().await.unwrap();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(10)).await;
            assert!(queue.is_ready("a").await.unwrap());
        }

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!queue.is_ready("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_daily_stats() {
        let (queue, _) = controller_with(config(10, 10, 0));
        queue.enqueue(Some("a".into())).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let recorded = queue.record_daily_stats(date).await.unwrap();
        assert_eq!(recorded.enqueued_total, 1);
        assert_eq!(queue.daily_stats(date).await.unwrap(), Some(recorded));
    }
}
