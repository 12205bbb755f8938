//! Cache key builders for all BoxOffice cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Seat keys are typed so ids
//! are never re-derived by splitting ad-hoc strings.

use std::fmt;

use boxoffice_core::types::{ScheduleId, SeatId};

/// Namespace of every seat lease and seat lock key.
const SEAT_NAMESPACE: &str = "seat";

/// Suffix that turns a seat key into its lock key.
const LOCK_SUFFIX: &str = "lock";

// ── Seat keys ──────────────────────────────────────────────

/// Typed key for one (schedule, seat) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatKey {
    /// The schedule.
    pub schedule_id: ScheduleId,
    /// The seat.
    pub seat_id: SeatId,
}

impl SeatKey {
    /// Create a key for a (schedule, seat) pair.
    pub fn new(schedule_id: ScheduleId, seat_id: SeatId) -> Self {
        Self {
            schedule_id,
            seat_id,
        }
    }

    /// Lease key holding the cached status: `seat:{schedule}:{seat}`.
    pub fn lease(&self) -> String {
        self.to_string()
    }

    /// Lock key guarding the pair: `seat:{schedule}:{seat}:lock`.
    pub fn lock(&self) -> String {
        format!("{self}:{LOCK_SUFFIX}")
    }

    /// Prefix matching every lease (and lock) key of a schedule.
    pub fn schedule_prefix(schedule_id: ScheduleId) -> String {
        format!("{SEAT_NAMESPACE}:{schedule_id}:")
    }

    /// Parse a lease key back into its typed form.
    ///
    /// Returns `None` for lock keys and anything that is not exactly
    /// `seat:{schedule}:{seat}`.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split(':');
        if parts.next()? != SEAT_NAMESPACE {
            return None;
        }
        let schedule_id = parts.next()?.parse().ok()?;
        let seat_id = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(schedule_id, seat_id))
    }
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SEAT_NAMESPACE}:{}:{}", self.schedule_id, self.seat_id)
    }
}

// ── Queue keys ─────────────────────────────────────────────

/// Key builder for the waiting room, scoped to a configurable namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    namespace: String,
}

impl QueueKeys {
    /// Create a key builder for `namespace` (e.g. `"queue"`).
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Waiting list of a shard.
    pub fn group(&self, shard: u64) -> String {
        format!("{}:group:{shard}", self.namespace)
    }

    /// Number of tokens ever pushed into a shard.
    pub fn group_pushed(&self, shard: u64) -> String {
        format!("{}:group:{shard}:pushed", self.namespace)
    }

    /// Lock guarding promotion of a shard.
    pub fn group_lock(&self, shard: u64) -> String {
        format!("{}:group:{shard}:lock", self.namespace)
    }

    /// Prefix of every ready flag.
    pub fn ready_prefix(&self) -> String {
        format!("{}:ready:", self.namespace)
    }

    /// Ready flag of a token.
    pub fn ready(&self, token: &str) -> String {
        format!("{}{token}", self.ready_prefix())
    }

    /// Marker of a token already sitting in a waiting list; holds its shard.
    pub fn waiting(&self, token: &str) -> String {
        format!("{}:waiting:{token}", self.namespace)
    }

    /// Privileged-token marker.
    pub fn vip(&self, token: &str) -> String {
        format!("{}:vip:{token}", self.namespace)
    }

    /// Global arrival sequence; the shard of a token derives from it.
    pub fn sequence(&self) -> String {
        format!("{}:seq", self.namespace)
    }

    /// Number of shards fully drained and retired; the head shard is this
    /// count plus one.
    pub fn head(&self) -> String {
        format!("{}:head", self.namespace)
    }

    /// Expiring window of admitted tokens whose ready flag is still live.
    pub fn admitted(&self) -> String {
        format!("{}:admitted", self.namespace)
    }

    /// Daily statistics snapshot.
    pub fn daily_stats(&self, date: &str) -> String {
        format!("{}:stats:{date}", self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_key_format() {
        let key = SeatKey::new(ScheduleId(7), SeatId(42));
        assert_eq!(key.lease(), "seat:7:42");
        assert_eq!(key.lock(), "seat:7:42:lock");
        assert!(key.lease().starts_with(&SeatKey::schedule_prefix(ScheduleId(7))));
    }

    #[test]
    fn test_seat_key_parse_is_exact() {
        let key = SeatKey::new(ScheduleId(7), SeatId(42));
        assert_eq!(SeatKey::parse(&key.lease()), Some(key));
        assert_eq!(SeatKey::parse(&key.lock()), None);
        assert_eq!(SeatKey::parse("seat:7"), None);
        assert_eq!(SeatKey::parse("seat:7:x"), None);
        assert_eq!(SeatKey::parse("queue:7:42"), None);
    }

    #[test]
    fn test_schedule_prefix_does_not_match_other_schedules() {
        let prefix = SeatKey::schedule_prefix(ScheduleId(1));
        let other = SeatKey::new(ScheduleId(12), SeatId(3)).lease();
        assert!(!other.starts_with(&prefix));
    }

    #[test]
    fn test_queue_keys_use_namespace() {
        let keys = QueueKeys::new("concert");
        assert_eq!(keys.group(3), "concert:group:3");
        assert_eq!(keys.group_lock(3), "concert:group:3:lock");
        assert_eq!(keys.ready("abc"), "concert:ready:abc");
        assert_eq!(keys.vip("abc"), "concert:vip:abc");
        assert_eq!(keys.waiting("abc"), "concert:waiting:abc");
        assert_eq!(keys.sequence(), "concert:seq");
    }
}
