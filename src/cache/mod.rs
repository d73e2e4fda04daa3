//! # In-memory TTL cache
//!
//! Typed cache for upstream payloads. Each entry is a tagged result: either
//! the last good payload or the error that last attempt produced, never
//! both. Error entries have a short TTL so a flapping upstream is retried
//! soon; success entries follow the publication-aware daily policy.
//!
//! ## Freshness rules
//! A success entry under [`TtlPolicy::DailyWindow`] is fresh while all hold:
//! - it is younger than the TTL,
//! - the calendar day (Buenos Aires time) has not changed since the write,
//! - no publication hour (`REFRESH_HOURS`) has been crossed since the write.
//!
//! Market-data caches use [`TtlPolicy::Fixed`], a plain age check.
//!
//! Reads and writes go through a sharded concurrent map; there is no
//! request coalescing, so two callers racing on a stale key may both fetch.

pub mod fallback;

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use dashmap::DashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::constants::REFRESH_HOURS;
use crate::error::FetchError;

/// Buenos Aires is UTC-3 year-round (no DST), so a fixed offset is exact.
const ART_OFFSET_SECS: i32 = -3 * 3600;

pub(crate) fn art() -> FixedOffset {
    FixedOffset::east_opt(ART_OFFSET_SECS).expect("ART offset is a valid constant")
}

/// Staleness policy for success entries. Error entries always use the
/// policy's `error_ttl`.
#[derive(Debug, Clone, Copy)]
pub enum TtlPolicy {
    /// Age limit plus day-change and publication-hour rules (BCRA data).
    DailyWindow {
        ttl: Duration,
        error_ttl: Duration,
        refresh_hours: &'static [u32],
    },
    /// Plain age limit (market quotes).
    Fixed { ttl: Duration, error_ttl: Duration },
}

impl TtlPolicy {
    /// The standard BCRA policy with the published refresh hours.
    pub fn daily(ttl: Duration, error_ttl: Duration) -> Self {
        TtlPolicy::DailyWindow {
            ttl,
            error_ttl,
            refresh_hours: &REFRESH_HOURS,
        }
    }

    pub fn fixed(ttl: Duration, error_ttl: Duration) -> Self {
        TtlPolicy::Fixed { ttl, error_ttl }
    }

    fn error_ttl(&self) -> Duration {
        match self {
            TtlPolicy::DailyWindow { error_ttl, .. } => *error_ttl,
            TtlPolicy::Fixed { error_ttl, .. } => *error_ttl,
        }
    }

    /// Whether a success entry written at `written` is still fresh at `now`.
    fn success_is_fresh(&self, written: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TtlPolicy::Fixed { ttl, .. } => age_within(written, now, *ttl),
            TtlPolicy::DailyWindow {
                ttl,
                refresh_hours,
                ..
            } => {
                if !age_within(written, now, *ttl) {
                    return false;
                }

                let tz = art();
                let written_local = written.with_timezone(&tz);
                let now_local = now.with_timezone(&tz);

                if written_local.date_naive() != now_local.date_naive() {
                    return false;
                }

                let written_hour = written_local.hour();
                let now_hour = now_local.hour();
                !refresh_hours
                    .iter()
                    .any(|&h| written_hour < h && now_hour >= h)
            }
        }
    }
}

fn age_within(written: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::max_value());
    now.signed_duration_since(written) < ttl
}

/// A cached fetch outcome and when it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub written_at: DateTime<Utc>,
    pub result: Result<T, FetchError>,
}

/// Result of a cache probe.
#[derive(Debug)]
pub enum CacheLookup<T> {
    /// Fresh payload; serve without touching the network.
    Fresh(T),
    /// Fresh error entry; re-surface without touching the network.
    FreshError(FetchError),
    /// Missing or stale; the caller should fetch.
    Stale,
}

/// Concurrent typed cache keyed by `K`.
pub struct MemoryCache<K, T> {
    entries: DashMap<K, CacheEntry<T>>,
    policy: TtlPolicy,
}

impl<K, T> MemoryCache<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    pub fn new(policy: TtlPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    pub fn lookup(&self, key: &K) -> CacheLookup<T> {
        self.lookup_at(key, Utc::now())
    }

    /// Probe with an explicit clock, for deterministic tests.
    pub fn lookup_at(&self, key: &K, now: DateTime<Utc>) -> CacheLookup<T> {
        let entry = match self.entries.get(key) {
            Some(e) => e,
            None => return CacheLookup::Stale,
        };

        match &entry.result {
            Ok(value) => {
                if self.policy.success_is_fresh(entry.written_at, now) {
                    CacheLookup::Fresh(value.clone())
                } else {
                    CacheLookup::Stale
                }
            }
            Err(err) => {
                if age_within(entry.written_at, now, self.policy.error_ttl()) {
                    CacheLookup::FreshError(err.clone())
                } else {
                    CacheLookup::Stale
                }
            }
        }
    }

    pub fn store_ok(&self, key: K, value: T) {
        self.insert_at(key, Ok(value), Utc::now());
    }

    pub fn store_err(&self, key: K, err: FetchError) {
        self.insert_at(key, Err(err), Utc::now());
    }

    /// Insert with an explicit write time, for deterministic tests.
    pub fn insert_at(&self, key: K, result: Result<T, FetchError>, written_at: DateTime<Utc>) {
        self.entries.insert(key, CacheEntry { written_at, result });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
