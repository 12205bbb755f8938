//! Seat reservation engine.
//!
//! The lease cache mirrors each (schedule, seat) status under
//! `seat:{schedule}:{seat}`; the reservation store is authoritative. Every
//! status change happens under the seat's lock, writes the cache first and
//! the store second, and reverts the cache if the store write fails.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use boxoffice_cache::{LockManager, LockOutcome, SeatKey};
use boxoffice_core::config::ReservationConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;
use boxoffice_core::types::{ReservationId, ScheduleId, SeatId};
use boxoffice_entity::reservation::{SeatReservation, SeatState};
use boxoffice_entity::seat::{Seat, SeatStatus};
use boxoffice_realtime::Notifier;

use crate::contiguity::find_contiguous_block;
use crate::outcome::{CapacityShortfall, MissingRecord, ReservationOutcome, SeatConflict};
use crate::store::ReservationStore;

/// Race-free seat allocation over the lease cache and reservation store.
#[derive(Debug)]
pub struct SeatReservationEngine {
    cache: Arc<dyn CacheProvider>,
    locks: LockManager,
    store: Arc<dyn ReservationStore>,
    notifier: Notifier,
    hold_ttl: Duration,
    lock_ttl: Duration,
}

impl SeatReservationEngine {
    /// Create an engine.
    pub fn new(
        cache: Arc<dyn CacheProvider>,
        store: Arc<dyn ReservationStore>,
        notifier: Notifier,
        config: &ReservationConfig,
    ) -> Self {
        Self {
            locks: LockManager::new(Arc::clone(&cache)),
            cache,
            store,
            notifier,
            hold_ttl: config.hold_ttl(),
            lock_ttl: config.lock_ttl(),
        }
    }

    /// Lifetime of a soft hold.
    pub fn hold_ttl(&self) -> Duration {
        self.hold_ttl
    }

    /// The durable store behind this engine.
    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    /// Hold one seat for the caller.
    pub async fn select_seat(
        &self,
        schedule_id: ScheduleId,
        seat_id: SeatId,
    ) -> AppResult<ReservationOutcome<SeatState>> {
        let key = SeatKey::new(schedule_id, seat_id);

        let status = match self.cached_status(key).await? {
            Some(status) => status,
            None => match self.sync_from_store(key).await? {
                Some(status) => status,
                None => {
                    return Ok(ReservationOutcome::NotFound(MissingRecord::Seat {
                        schedule_id,
                        seat_id,
                    }));
                }
            },
        };

        if status.is_taken() {
            debug!(schedule_id = %schedule_id, seat_id = %seat_id, status = %status, "Seat already taken");
            return Ok(ReservationOutcome::Conflict(SeatConflict::reserved(
                schedule_id,
                seat_id,
            )));
        }

        let outcome = self
            .locks
            .with_lock(&key.lock(), self.lock_ttl, || async move {
                if !self.is_free_locked(key).await? {
                    return Ok(None);
                }
                self.write_statuses(schedule_id, &[(seat_id, SeatStatus::Reserved)])
                    .await
                    .map(Some)
            })
            .await?;

        match outcome {
            LockOutcome::Busy => {
                warn!(schedule_id = %schedule_id, seat_id = %seat_id, "Seat lock busy");
                Ok(ReservationOutcome::Conflict(SeatConflict::busy(
                    schedule_id,
                    seat_id,
                )))
            }
            LockOutcome::Completed(None) => Ok(ReservationOutcome::Conflict(
                SeatConflict::reserved(schedule_id, seat_id),
            )),
            LockOutcome::Completed(Some(records)) => {
                info!(schedule_id = %schedule_id, seat_id = %seat_id, "Seat reserved");
                self.publish_changes(&records).await;
                Ok(ReservationOutcome::Success(SeatState::new(
                    seat_id,
                    SeatStatus::Reserved,
                )))
            }
        }
    }

    /// Hold `count` seats, preferring a contiguous block in one row.
    ///
    /// Tiers, first success wins: contiguous AVAILABLE seats known to the
    /// cache, then contiguous AVAILABLE records in the store, then the free
    /// remainder of the catalog (contiguous if possible, otherwise lowest
    /// seat IDs). Sufficiency is decided before any write, so a capacity
    /// failure changes nothing.
    pub async fn auto_assign_seats(
        &self,
        schedule_id: ScheduleId,
        count: usize,
    ) -> AppResult<ReservationOutcome<Vec<SeatState>>> {
        if count == 0 {
            return Err(AppError::validation("At least one seat must be requested"));
        }

        let cached = self.cached_available_seats(schedule_id).await?;
        if let Some(block) = find_contiguous_block(&cached, count) {
            debug!(schedule_id = %schedule_id, count, tier = 1, "Contiguous block found in cache");
            return self.commit_block(schedule_id, block).await;
        }

        let stored = self.stored_available_seats(schedule_id).await?;
        if let Some(block) = find_contiguous_block(&stored, count) {
            debug!(schedule_id = %schedule_id, count, tier = 2, "Contiguous block found in store");
            return self.commit_block(schedule_id, block).await;
        }

        let recorded: HashSet<SeatId> = self
            .store
            .list_reservations(schedule_id)
            .await?
            .iter()
            .map(|record| record.seat_id)
            .collect();
        let mut free: Vec<Seat> = self
            .store
            .list_seats(schedule_id)
            .await?
            .into_iter()
            .filter(|seat| !recorded.contains(&seat.id))
            .collect();
        free.extend(stored);

        if free.len() < count {
            info!(
                schedule_id = %schedule_id,
                requested = count,
                available = free.len(),
                "Not enough seats for request"
            );
            return Ok(ReservationOutcome::Capacity(CapacityShortfall {
                schedule_id,
                requested: count,
                available: free.len(),
            }));
        }

        let block = match find_contiguous_block(&free, count) {
            Some(block) => block,
            None => {
                free.sort_by_key(|seat| seat.id);
                free.truncate(count);
                free
            }
        };
        debug!(schedule_id = %schedule_id, count, tier = 3, "Assigning overflow seats");
        self.commit_block(schedule_id, block).await
    }

    /// Seats of a schedule that are held or sold, sorted by seat ID.
    ///
    /// Held seats come from the cache; sold seats from the store. A sold
    /// record overrides whatever the cache says about the same seat.
    pub async fn get_seats_status(&self, schedule_id: ScheduleId) -> AppResult<Vec<SeatState>> {
        let mut merged: BTreeMap<SeatId, SeatStatus> = BTreeMap::new();

        for raw in self
            .cache
            .scan_prefix(&SeatKey::schedule_prefix(schedule_id))
            .await?
        {
            let Some(key) = SeatKey::parse(&raw) else {
                continue;
            };
            if let Some(status) = self.cached_status(key).await? {
                if status.is_taken() {
                    merged.insert(key.seat_id, status);
                }
            }
        }

        for record in self
            .store
            .list_by_status(schedule_id, SeatStatus::Completed)
            .await?
        {
            merged.insert(record.seat_id, SeatStatus::Completed);
        }

        Ok(merged
            .into_iter()
            .map(|(seat_id, status)| SeatState::new(seat_id, status))
            .collect())
    }

    /// Apply a payment outcome: `COMPLETED` on success, `AVAILABLE` as the
    /// compensating revert on failure or cancellation.
    pub async fn set_reservation_status(
        &self,
        reservation_id: ReservationId,
        status: SeatStatus,
    ) -> AppResult<ReservationOutcome<SeatState>> {
        if !matches!(status, SeatStatus::Completed | SeatStatus::Available) {
            return Err(AppError::validation(format!(
                "Reservation status can only be set to COMPLETED or AVAILABLE, got {status}"
            )));
        }

        let Some(record) = self.store.find_reservation_by_id(reservation_id).await? else {
            return Ok(ReservationOutcome::NotFound(MissingRecord::Reservation {
                reservation_id,
            }));
        };

        let key = SeatKey::new(record.schedule_id, record.seat_id);
        let outcome = self
            .locks
            .with_lock(&key.lock(), self.lock_ttl, || async move {
                self.write_statuses(key.schedule_id, &[(key.seat_id, status)])
                    .await
            })
            .await?;

        match outcome {
            LockOutcome::Busy => {
                warn!(reservation_id = %reservation_id, seat_id = %key.seat_id, "Seat lock busy");
                Ok(ReservationOutcome::Conflict(SeatConflict::busy(
                    key.schedule_id,
                    key.seat_id,
                )))
            }
            LockOutcome::Completed(records) => {
                info!(
                    reservation_id = %reservation_id,
                    schedule_id = %key.schedule_id,
                    seat_id = %key.seat_id,
                    status = %status,
                    "Reservation status updated"
                );
                self.publish_changes(&records).await;
                Ok(ReservationOutcome::Success(SeatState::new(key.seat_id, status)))
            }
        }
    }

    /// Return RESERVED records untouched for longer than `stale_after` to
    /// AVAILABLE. Returns how many holds were released.
    pub async fn release_stale_holds(&self, stale_after: Duration) -> AppResult<usize> {
        let age = chrono::Duration::from_std(stale_after)
            .map_err(|e| AppError::validation(format!("Invalid hold age: {e}")))?;
        let cutoff = Utc::now() - age;

        let mut released = 0;
        for record in self.store.find_stale(SeatStatus::Reserved, cutoff).await? {
            let key = SeatKey::new(record.schedule_id, record.seat_id);
            let outcome = self
                .locks
                .with_lock(&key.lock(), self.lock_ttl, || async move {
                    let current = self
                        .store
                        .find_reservation(key.schedule_id, key.seat_id)
                        .await?;
                    let still_stale = current.is_some_and(|r| {
                        r.status == SeatStatus::Reserved && r.updated_at < cutoff
                    });
                    if !still_stale {
                        return Ok(false);
                    }
                    self.write_statuses(key.schedule_id, &[(key.seat_id, SeatStatus::Available)])
                        .await?;
                    Ok(true)
                })
                .await?;

            match outcome {
                LockOutcome::Completed(true) => {
                    released += 1;
                    info!(schedule_id = %key.schedule_id, seat_id = %key.seat_id, "Released abandoned hold");
                    self.notifier
                        .hold_expired(key.schedule_id, key.seat_id)
                        .await;
                }
                LockOutcome::Completed(false) => {}
                LockOutcome::Busy => {
                    debug!(seat_id = %key.seat_id, "Skipping stale hold with busy lock");
                }
            }
        }
        Ok(released)
    }

    /// Lock every seat of `block`, re-verify, and reserve them together.
    async fn commit_block(
        &self,
        schedule_id: ScheduleId,
        block: Vec<Seat>,
    ) -> AppResult<ReservationOutcome<Vec<SeatState>>> {
        let Some(first) = block.first().map(|seat| seat.id) else {
            return Ok(ReservationOutcome::Success(Vec::new()));
        };
        let lock_keys: Vec<String> = block
            .iter()
            .map(|seat| SeatKey::new(schedule_id, seat.id).lock())
            .collect();
        let changes: Vec<(SeatId, SeatStatus)> = block
            .iter()
            .map(|seat| (seat.id, SeatStatus::Reserved))
            .collect();

        let outcome = self
            .locks
            .with_locks(&lock_keys, self.lock_ttl, || async move {
                for seat in &block {
                    if !self.is_free_locked(SeatKey::new(schedule_id, seat.id)).await? {
                        return Ok(Err(seat.id));
                    }
                }
                self.write_statuses(schedule_id, &changes).await.map(Ok)
            })
            .await?;

        match outcome {
            LockOutcome::Busy => {
                warn!(schedule_id = %schedule_id, seat_id = %first, "Seat block lock busy");
                Ok(ReservationOutcome::Conflict(SeatConflict::busy(
                    schedule_id,
                    first,
                )))
            }
            LockOutcome::Completed(Err(taken)) => {
                debug!(schedule_id = %schedule_id, seat_id = %taken, "Seat in block was taken");
                Ok(ReservationOutcome::Conflict(SeatConflict::reserved(
                    schedule_id,
                    taken,
                )))
            }
            LockOutcome::Completed(Ok(records)) => {
                info!(schedule_id = %schedule_id, count = records.len(), "Seat block reserved");
                self.publish_changes(&records).await;
                Ok(ReservationOutcome::Success(
                    records.iter().map(SeatReservation::state).collect(),
                ))
            }
        }
    }

    /// Re-check a seat while its lock is held. The store wins over the
    /// cache; a taken store record is copied back into the cache.
    async fn is_free_locked(&self, key: SeatKey) -> AppResult<bool> {
        if self
            .cached_status(key)
            .await?
            .is_some_and(|status| status.is_taken())
        {
            return Ok(false);
        }

        match self
            .store
            .find_reservation(key.schedule_id, key.seat_id)
            .await?
        {
            Some(record) if record.status.is_taken() => {
                self.cache
                    .set(&key.lease(), record.status.as_str(), self.hold_ttl)
                    .await?;
                Ok(false)
            }
            _ => Ok(true),
        }
    }

    /// Cache-aside miss path: read (or create) the store record and
    /// backfill the cache without overwriting a fresher entry.
    ///
    /// Returns `None` when the seat is not in the schedule's catalog.
    async fn sync_from_store(&self, key: SeatKey) -> AppResult<Option<SeatStatus>> {
        let record = match self
            .store
            .find_reservation(key.schedule_id, key.seat_id)
            .await?
        {
            Some(record) => record,
            None => {
                let in_catalog = self
                    .store
                    .find_seat(key.seat_id)
                    .await?
                    .is_some_and(|seat| seat.schedule_id == key.schedule_id);
                if !in_catalog {
                    return Ok(None);
                }
                self.store
                    .get_or_create_available(key.schedule_id, key.seat_id)
                    .await?
            }
        };

        self.cache
            .set_nx(&key.lease(), record.status.as_str(), self.hold_ttl)
            .await?;
        debug!(
            schedule_id = %key.schedule_id,
            seat_id = %key.seat_id,
            status = %record.status,
            "Synced seat status from store"
        );
        Ok(Some(record.status))
    }

    async fn cached_status(&self, key: SeatKey) -> AppResult<Option<SeatStatus>> {
        let Some(raw) = self.cache.get(&key.lease()).await? else {
            return Ok(None);
        };
        match raw.parse::<SeatStatus>() {
            Ok(status) => Ok(Some(status)),
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring unrecognised cached seat status");
                Ok(None)
            }
        }
    }

    async fn cached_available_seats(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>> {
        let mut ids = Vec::new();
        for raw in self
            .cache
            .scan_prefix(&SeatKey::schedule_prefix(schedule_id))
            .await?
        {
            let Some(key) = SeatKey::parse(&raw) else {
                continue;
            };
            if self.cached_status(key).await? == Some(SeatStatus::Available) {
                ids.push(key.seat_id);
            }
        }
        self.catalog_seats(schedule_id, &ids).await
    }

    async fn stored_available_seats(&self, schedule_id: ScheduleId) -> AppResult<Vec<Seat>> {
        let ids: Vec<SeatId> = self
            .store
            .list_by_status(schedule_id, SeatStatus::Available)
            .await?
            .iter()
            .map(|record| record.seat_id)
            .collect();
        self.catalog_seats(schedule_id, &ids).await
    }

    async fn catalog_seats(&self, schedule_id: ScheduleId, ids: &[SeatId]) -> AppResult<Vec<Seat>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut seats = self.store.find_seats(ids).await?;
        seats.retain(|seat| seat.schedule_id == schedule_id);
        Ok(seats)
    }

    /// Write statuses to cache then store. If the store write fails, every
    /// touched cache entry is put back to its previous value.
    async fn write_statuses(
        &self,
        schedule_id: ScheduleId,
        changes: &[(SeatId, SeatStatus)],
    ) -> AppResult<Vec<SeatReservation>> {
        let mut previous: Vec<(String, Option<String>)> = Vec::with_capacity(changes.len());
        for (seat_id, status) in changes {
            let lease = SeatKey::new(schedule_id, *seat_id).lease();
            let prior = match self.cache.get(&lease).await {
                Ok(prior) => prior,
                Err(e) => {
                    self.revert_cache(&previous).await;
                    return Err(e);
                }
            };
            previous.push((lease.clone(), prior));
            if let Err(e) = self.cache.set(&lease, status.as_str(), self.hold_ttl).await {
                self.revert_cache(&previous).await;
                return Err(e);
            }
        }

        match self.store.set_statuses(schedule_id, changes).await {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(
                    schedule_id = %schedule_id,
                    seats = changes.len(),
                    error = %e,
                    "Store write failed, reverting cache"
                );
                self.revert_cache(&previous).await;
                Err(e)
            }
        }
    }

    async fn revert_cache(&self, previous: &[(String, Option<String>)]) {
        for (lease, prior) in previous {
            let result = match prior {
                Some(value) => self.cache.set(lease, value, self.hold_ttl).await,
                None => self.cache.delete(lease).await,
            };
            if let Err(e) = result {
                error!(key = %lease, error = %e, "Failed to revert cache entry");
            }
        }
    }

    async fn publish_changes(&self, records: &[SeatReservation]) {
        for record in records {
            self.notifier
                .seat_status_changed(record.schedule_id, record.seat_id, record.status.as_str())
                .await;
        }
    }
}
