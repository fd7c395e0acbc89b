//! Statement cache counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for statement cache activity.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Lookups that found a cached statement.
    hits: AtomicU64,
    /// Lookups that did not.
    misses: AtomicU64,
    /// Entries dropped by the LRU policy.
    evictions: AtomicU64,
    /// Handles whose release failed (and was swallowed).
    release_failures: AtomicU64,
}

impl CacheMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release_failure(&self) {
        self.release_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn release_failures(&self) -> u64 {
        self.release_failures.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            release_failures: self.release_failures(),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.release_failures.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`CacheMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub release_failures: u64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a percentage, or `None` before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.total_lookups();
        if total == 0 {
            None
        } else {
            Some((self.hits as f64 / total as f64) * 100.0)
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hit_rate = self
            .hit_rate()
            .map_or_else(|| "N/A".to_string(), |r| format!("{r:.1}%"));
        write!(
            f,
            "Statement cache: hits={}, misses={}, hit_rate={}, evictions={}, release_failures={}",
            self.hits, self.misses, hit_rate, self.evictions, self.release_failures
        )
    }
}
