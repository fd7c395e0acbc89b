//! LRU cache of prepared statement handles.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use lru::LruCache;

use super::metrics::{CacheMetrics, MetricsSnapshot};
use crate::driver::PreparedHandle;
use crate::query::ResultMeta;

/// Identity of a cached statement: its text plus the schema it runs under.
///
/// The same text under two different schemas is two different keys, since
/// it may resolve to tables of a different shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    sql: String,
    schema: Option<String>,
}

impl StatementKey {
    pub fn new(sql: impl Into<String>, schema: Option<&str>) -> Self {
        Self {
            sql: sql.into(),
            schema: schema.map(str::to_string),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.sql, self.schema.as_deref().unwrap_or("nil"))
    }
}

/// A cached statement handle and its result metadata slot.
#[derive(Debug)]
pub struct CacheEntry<S> {
    pub(crate) statement: S,
    pub(crate) meta: OnceLock<Arc<ResultMeta>>,
}

impl<S> CacheEntry<S> {
    fn new(statement: S) -> Self {
        Self {
            statement,
            meta: OnceLock::new(),
        }
    }

    pub fn statement(&self) -> &S {
        &self.statement
    }

    /// Metadata attached by the first execution, if any.
    pub fn meta(&self) -> Option<&Arc<ResultMeta>> {
        self.meta.get()
    }

    /// Attach metadata unless some is already attached.
    ///
    /// Returns the metadata now held by the entry, which is the earlier one
    /// if the slot was already filled.
    pub fn attach_meta(&self, meta: Arc<ResultMeta>) -> &Arc<ResultMeta> {
        self.meta.get_or_init(|| meta)
    }
}

/// Bounded, access-ordered statement cache.
///
/// A capacity of zero or less disables the cache: lookups miss, inserts
/// hand the statement back and nothing is ever released by the cache.
/// Evicted, displaced and cleared handles are closed through
/// [`StatementCache::evict`], which never fails.
pub struct StatementCache<S: PreparedHandle> {
    entries: Option<LruCache<StatementKey, CacheEntry<S>>>,
    metrics: CacheMetrics,
}

impl<S: PreparedHandle> StatementCache<S> {
    /// Create a cache holding at most `capacity` statements.
    pub fn new(capacity: i64) -> Self {
        let entries = if capacity > 0 {
            NonZeroUsize::new(usize::try_from(capacity).unwrap_or(usize::MAX)).map(LruCache::new)
        } else {
            None
        };
        Self {
            entries,
            metrics: CacheMetrics::new(),
        }
    }

    /// A cache that never holds anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Maximum number of statements held; 0 when disabled.
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is cached. Does not touch recency or metrics.
    pub fn contains(&self, key: &StatementKey) -> bool {
        self.entries.as_ref().is_some_and(|e| e.contains(key))
    }

    /// Look up a statement, marking it most recently used.
    pub fn get(&mut self, key: &StatementKey) -> Option<&S> {
        self.entry_mut(key).map(|entry| &entry.statement)
    }

    /// Look up a cache entry, marking it most recently used.
    pub fn entry_mut(&mut self, key: &StatementKey) -> Option<&mut CacheEntry<S>> {
        let entries = self.entries.as_mut()?;
        match entries.get_mut(key) {
            Some(entry) => {
                self.metrics.record_hit();
                tracing::trace!(sql = key.sql(), schema = ?key.schema(), "Statement cache hit");
                Some(entry)
            }
            None => {
                self.metrics.record_miss();
                tracing::trace!(sql = key.sql(), schema = ?key.schema(), "Statement cache miss");
                None
            }
        }
    }

    /// Insert a statement without releasing anything.
    ///
    /// Returns the entry pushed out by this insertion, either the previous
    /// statement for the same key or the least recently used entry when the
    /// cache was full. The caller owns its release, typically through
    /// [`StatementCache::evict`]. When the cache is disabled the statement is
    /// handed back as `Err`.
    pub fn insert(
        &mut self,
        key: StatementKey,
        statement: S,
    ) -> Result<Option<(StatementKey, S)>, S> {
        let Some(entries) = self.entries.as_mut() else {
            return Err(statement);
        };
        let displaced = entries.push(key.clone(), CacheEntry::new(statement));
        Ok(displaced.map(|(old_key, old)| {
            if old_key != key {
                self.metrics.record_eviction();
            }
            (old_key, old.statement)
        }))
    }

    /// Insert a statement, releasing whatever it displaces.
    ///
    /// Returns the statement as `Err` when the cache is disabled; the caller
    /// then keeps responsibility for closing it.
    pub fn put(&mut self, key: StatementKey, statement: S) -> Result<(), S> {
        if let Some((old_key, old)) = self.insert(key, statement)? {
            self.evict(&old_key, old);
        }
        Ok(())
    }

    /// Insert a statement and return its fresh entry.
    ///
    /// Same eviction behavior as [`StatementCache::put`].
    pub fn put_entry(&mut self, key: StatementKey, statement: S) -> Result<&mut CacheEntry<S>, S> {
        let Some(entries) = self.entries.as_mut() else {
            return Err(statement);
        };
        if let Some(old) = entries.pop(&key) {
            release(&self.metrics, &key, old.statement);
        } else if entries.len() >= entries.cap().get() {
            if let Some((old_key, old)) = entries.pop_lru() {
                self.metrics.record_eviction();
                release(&self.metrics, &old_key, old.statement);
            }
        }
        Ok(entries.get_or_insert_mut(key, || CacheEntry::new(statement)))
    }

    /// Close and drop every cached statement.
    pub fn clear(&mut self) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let count = entries.len();
        while let Some((key, entry)) = entries.pop_lru() {
            release(&self.metrics, &key, entry.statement);
        }
        tracing::debug!(count, "Statement cache cleared");
    }

    /// Release a statement that left the cache.
    ///
    /// Close failures are logged and counted, never returned.
    pub fn evict(&self, key: &StatementKey, statement: S) {
        release(&self.metrics, key, statement);
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&StatementKey> {
        self.entries
            .as_ref()
            .map(|e| e.iter().map(|(k, _)| k).collect())
            .unwrap_or_default()
    }
}

impl<S: PreparedHandle> Drop for StatementCache<S> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<S: PreparedHandle> fmt::Debug for StatementCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementCache")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

fn release<S: PreparedHandle>(metrics: &CacheMetrics, key: &StatementKey, mut statement: S) {
    tracing::debug!(sql = key.sql(), schema = ?key.schema(), "Releasing cached statement");
    if let Err(e) = statement.close() {
        metrics.record_release_failure();
        tracing::warn!(sql = key.sql(), error = %e, "Failed to release statement");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Cell, ColumnDescriptor, Driver, MemoryDriver, MemoryStatement, MemoryTable};
    use crate::query::ResultMode;
    use crate::types::SqlType;
    use crate::vendor::PlainTypeMap;

    fn driver(statements: &[&str]) -> MemoryDriver {
        let mut driver = MemoryDriver::new();
        for sql in statements {
            let table = MemoryTable::new(vec![ColumnDescriptor::new("n", SqlType::INTEGER, "int4")])
                .with_row(vec![Cell::Int(1)]);
            driver.register(*sql, table);
        }
        driver
    }

    fn key(sql: &str) -> StatementKey {
        StatementKey::new(sql, None)
    }

    fn fill(cache: &mut StatementCache<MemoryStatement>, driver: &mut MemoryDriver, sql: &str) -> u64 {
        let stmt = driver.prepare(sql).unwrap();
        let id = stmt.id();
        cache.put(key(sql), stmt).unwrap();
        id
    }

    #[test]
    fn test_key_display() {
        assert_eq!(StatementKey::new("SELECT 1", None).to_string(), "SELECT 1 : nil");
        assert_eq!(StatementKey::new("SELECT 1", Some("app")).to_string(), "SELECT 1 : app");
    }

    #[test]
    fn test_schema_makes_keys_distinct() {
        assert_ne!(StatementKey::new("q", Some("a")), StatementKey::new("q", Some("b")));
        assert_ne!(StatementKey::new("q", Some("a")), StatementKey::new("q", None));
        assert_eq!(StatementKey::new("q", Some("a")), StatementKey::new("q", Some("a")));
    }

    #[test]
    fn test_disabled_cache_is_pass_through() {
        for capacity in [0, -1, i64::MIN] {
            let mut driver = driver(&["a"]);
            let mut cache = StatementCache::new(capacity);
            assert!(!cache.is_enabled());

            let stmt = driver.prepare("a").unwrap();
            let mut returned = cache.put(key("a"), stmt).unwrap_err();
            assert!(cache.get(&key("a")).is_none());
            assert_eq!(cache.len(), 0);
            assert_eq!(cache.capacity(), 0);

            // The cache did not close it; the caller still owns it.
            assert!(!returned.is_closed());
            returned.close().unwrap();
        }
    }

    #[test]
    fn test_lru_by_access_not_insertion() {
        let mut driver = driver(&["a", "b", "c"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(2);

        let a = fill(&mut cache, &mut driver, "a");
        let b = fill(&mut cache, &mut driver, "b");
        assert!(cache.get(&key("a")).is_some());
        fill(&mut cache, &mut driver, "c");

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert_eq!(stats.closed_ids(), vec![b]);
        assert_ne!(a, b);
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_overflow_evicts_exactly_one() {
        let mut driver = driver(&["a", "b", "c", "d"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(3);
        let first = fill(&mut cache, &mut driver, "a");
        for sql in ["b", "c", "d"] {
            fill(&mut cache, &mut driver, sql);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(stats.closed_ids(), vec![first]);
    }

    #[test]
    fn test_replacing_key_releases_old_handle() {
        let mut driver = driver(&["a"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(4);
        let old = fill(&mut cache, &mut driver, "a");
        let new = fill(&mut cache, &mut driver, "a");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")).map(MemoryStatement::id), Some(new));
        assert_eq!(stats.closed_ids(), vec![old]);
        assert_eq!(cache.metrics().evictions, 0);
    }

    #[test]
    fn test_insert_defers_release_to_caller() {
        let mut driver = driver(&["a", "b"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(1);

        assert!(cache.insert(key("a"), driver.prepare("a").unwrap()).unwrap().is_none());
        let (evicted_key, evicted) = cache
            .insert(key("b"), driver.prepare("b").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(evicted_key, key("a"));
        assert!(!evicted.is_closed());
        assert_eq!(stats.closed(), 0);

        cache.evict(&evicted_key, evicted);
        assert_eq!(stats.closed(), 1);
    }

    #[test]
    fn test_clear_releases_every_handle_once() {
        let mut driver = driver(&["a", "b", "c"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(10);
        let mut ids: Vec<u64> = ["a", "b", "c"]
            .iter()
            .map(|sql| fill(&mut cache, &mut driver, sql))
            .collect();

        cache.clear();
        assert!(cache.is_empty());

        let mut closed = stats.closed_ids();
        closed.sort_unstable();
        ids.sort_unstable();
        assert_eq!(closed, ids);

        cache.clear();
        assert_eq!(stats.closed(), 3);
    }

    #[test]
    fn test_release_failure_is_swallowed() {
        let mut driver = driver(&["a", "b"]);
        let stats = driver.stats();
        driver.set_fail_close(true);
        let mut cache = StatementCache::new(1);

        fill(&mut cache, &mut driver, "a");
        fill(&mut cache, &mut driver, "b");

        assert!(cache.contains(&key("b")));
        assert_eq!(stats.closed(), 1);
        assert_eq!(cache.metrics().release_failures, 1);
    }

    #[test]
    fn test_drop_releases_handles() {
        let mut driver = driver(&["a", "b"]);
        let stats = driver.stats();
        {
            let mut cache = StatementCache::new(5);
            fill(&mut cache, &mut driver, "a");
            fill(&mut cache, &mut driver, "b");
        }
        assert_eq!(stats.closed(), 2);
    }

    #[test]
    fn test_put_entry_evicts_and_returns_fresh_entry() {
        let mut driver = driver(&["a", "b"]);
        let stats = driver.stats();
        let mut cache = StatementCache::new(1);
        let a = fill(&mut cache, &mut driver, "a");

        let stmt = driver.prepare("b").unwrap();
        let b = stmt.id();
        let entry = cache.put_entry(key("b"), stmt).unwrap();
        assert_eq!(entry.statement().id(), b);
        assert!(entry.meta().is_none());

        assert_eq!(stats.closed_ids(), vec![a]);
        assert_eq!(cache.keys(), vec![&key("b")]);
    }

    #[test]
    fn test_meta_slot_is_write_once() {
        let mut driver = driver(&["a"]);
        let mut cache = StatementCache::new(1);
        let entry = cache.put_entry(key("a"), driver.prepare("a").unwrap()).unwrap();

        let columns = [ColumnDescriptor::new("n", SqlType::INTEGER, "int4")];
        let first = Arc::new(ResultMeta::build(&columns, ResultMode::Plain, &PlainTypeMap).unwrap());
        let second = Arc::new(ResultMeta::build(&columns, ResultMode::Plain, &PlainTypeMap).unwrap());

        assert!(Arc::ptr_eq(entry.attach_meta(Arc::clone(&first)), &first));
        assert!(Arc::ptr_eq(entry.attach_meta(second), &first));
        assert!(Arc::ptr_eq(entry.meta().unwrap(), &first));
    }

    #[test]
    fn test_hit_and_miss_metrics() {
        let mut driver = driver(&["a"]);
        let mut cache = StatementCache::new(2);
        assert!(cache.get(&key("a")).is_none());
        fill(&mut cache, &mut driver, "a");
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.contains(&key("a")));

        let metrics = cache.metrics();
        assert_eq!((metrics.hits, metrics.misses), (1, 1));
    }
}
