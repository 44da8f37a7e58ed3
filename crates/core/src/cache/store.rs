//! In-memory cache table with lazy, access-triggered eviction.
//!
//! The table lives behind a `std::sync::Mutex` that is held only for the
//! sweep, the lookup and the insert. Computations run with the lock
//! released, so a slow network call never blocks other lookups. Two
//! concurrent misses on the same key may both compute; the last insert
//! wins. Entries are always replaced whole, never patched, so readers see
//! either the old or the new entry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use super::{CacheConfig, CacheKey, Clock, Nullable, SystemClock};

/// The last computed value for a key and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    timestamp: DateTime<Local>,
}

impl<T> CacheEntry<T> {
    fn new(value: T, timestamp: DateTime<Local>) -> Self {
        Self { value, timestamp }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Returns true once the entry is older than `ttl`.
    fn is_expired(&self, now: DateTime<Local>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.timestamp) > ttl
    }
}

impl<T: Nullable> CacheEntry<T> {
    /// Whether an unexpired entry may be returned under `config`.
    fn is_reusable(&self, now: DateTime<Local>, config: &CacheConfig) -> bool {
        let same_day =
            !config.daily_refresh() || self.timestamp.date_naive() == now.date_naive();
        let null_allowed = config.cache_none() || !self.value.is_null();
        same_day && null_allowed
    }
}

/// A keyed table of cache entries owned by one cached function or method.
pub struct CacheStore<T> {
    name: String,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    table: Mutex<HashMap<CacheKey, CacheEntry<T>>>,
}

impl<T> fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("entries", &self.table().len())
            .finish()
    }
}

impl<T> CacheStore<T> {
    /// Creates an empty store stamped by the system clock.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Creates an empty store stamped by `clock`.
    pub fn with_clock(name: impl Into<String>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            table: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.table().clear();
        tracing::debug!(cache = %self.name, "cache cleared");
    }

    /// Number of stored entries, including ones the next sweep would drop.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Stores `value` under `key`, replacing whatever was there.
    pub fn insert(&self, key: CacheKey, value: T) {
        let entry = CacheEntry::new(value, self.clock.now());
        self.table().insert(key, entry);
    }

    // The table is consistent even if a holder panicked: entries are only
    // ever inserted or removed whole.
    fn table(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<T>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Nullable> CacheStore<T> {
    /// Sweeps expired entries, then returns the value under `key` if it may
    /// be reused.
    pub fn lookup(&self, key: &CacheKey) -> Option<T> {
        let now = self.clock.now();
        let ttl = self.config.chrono_ttl();
        let mut table = self.table();

        let before = table.len();
        table.retain(|_, entry| !entry.is_expired(now, ttl));
        let swept = before - table.len();
        if swept > 0 {
            tracing::trace!(cache = %self.name, swept, "expired entries removed");
        }

        let entry = table.get(key)?;
        if !entry.is_reusable(now, &self.config) {
            tracing::trace!(cache = %self.name, key = %key, "cached entry invalidated");
            return None;
        }

        if let Some(trace) = self.config.trace_format() {
            tracing::info!(
                target: "iotcal_core::cache",
                cache = %self.name,
                "{}",
                trace.render(&entry.timestamp)
            );
        }
        tracing::trace!(cache = %self.name, key = %key, "cache hit");
        Some(entry.value.clone())
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        self.store_computed(key, compute())
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for fallible
    /// computations. Errors are returned unchanged and nothing is stored,
    /// so the next call computes again.
    pub fn get_or_try_compute<E, F>(&self, key: CacheKey, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        match compute() {
            Ok(value) => Ok(self.store_computed(key, value)),
            Err(err) => {
                tracing::warn!(
                    cache = %self.name,
                    key = %key,
                    "computation failed, nothing cached"
                );
                Err(err)
            }
        }
    }

    /// Async twin of [`get_or_compute`](Self::get_or_compute). The table lock
    /// is never held across the computation's `.await`.
    pub async fn get_or_compute_async<F, Fut>(&self, key: CacheKey, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        let value = compute().await;
        self.store_computed(key, value)
    }

    /// Async twin of [`get_or_try_compute`](Self::get_or_try_compute).
    pub async fn get_or_try_compute_async<E, F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        match compute().await {
            Ok(value) => Ok(self.store_computed(key, value)),
            Err(err) => {
                tracing::warn!(
                    cache = %self.name,
                    key = %key,
                    "computation failed, nothing cached"
                );
                Err(err)
            }
        }
    }

    fn store_computed(&self, key: CacheKey, value: T) -> T {
        tracing::debug!(cache = %self.name, key = %key, "value computed and cached");
        self.insert(key, value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{derive_key, ManualClock};
    use chrono::{Duration, TimeZone};
    use std::io;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn start_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn store_with(config: CacheConfig) -> (CacheStore<Option<u32>>, ManualClock) {
        let clock = ManualClock::new(start_time());
        let store = CacheStore::with_clock("test", config, Arc::new(clock.clone()));
        (store, clock)
    }

    fn key(n: u32) -> CacheKey {
        derive_key("test", None, &(n,)).unwrap()
    }

    #[test]
    fn test_compute_once_within_ttl() {
        let (store, clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(7)
        };

        assert_eq!(store.get_or_compute(key(1), compute), Some(7));
        clock.advance(Duration::seconds(9));
        assert_eq!(store.get_or_compute(key(1), compute), Some(7));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recompute_after_ttl() {
        let (store, clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);
        let compute = || Some(calls.fetch_add(1, Ordering::SeqCst) as u32);

        assert_eq!(store.get_or_compute(key(1), compute), Some(0));
        clock.advance(Duration::milliseconds(10_001));
        assert_eq!(store.get_or_compute(key(1), compute), Some(1));
    }

    #[test]
    fn test_entry_at_exact_ttl_is_still_fresh() {
        let (store, clock) = store_with(CacheConfig::new(10.0).unwrap());
        store.insert(key(1), Some(1));
        clock.advance(Duration::seconds(10));
        assert_eq!(store.lookup(&key(1)), Some(Some(1)));
    }

    #[test]
    fn test_sweep_removes_every_expired_entry() {
        let (store, clock) = store_with(CacheConfig::new(10.0).unwrap());
        store.insert(key(1), Some(1));
        store.insert(key(2), Some(2));
        clock.advance(Duration::seconds(5));
        store.insert(key(3), Some(3));
        clock.advance(Duration::seconds(6));

        // Looking up an unrelated key still sweeps the two old entries.
        assert_eq!(store.lookup(&key(4)), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(&key(3)), Some(Some(3)));
    }

    #[test]
    fn test_daily_refresh_invalidates_on_day_change() {
        let config = CacheConfig::new(3_600.0).unwrap().with_daily_refresh(true);
        let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 6, 15, 23, 50, 0).unwrap());
        let store: CacheStore<u32> =
            CacheStore::with_clock("daily", config, Arc::new(clock.clone()));
        let calls = AtomicUsize::new(0);
        let compute = || calls.fetch_add(1, Ordering::SeqCst) as u32;

        assert_eq!(store.get_or_compute(key(1), compute), 0);
        clock.advance(Duration::minutes(5));
        assert_eq!(store.get_or_compute(key(1), compute), 0);

        clock.set(Local.with_ymd_and_hms(2024, 6, 16, 0, 5, 0).unwrap());
        assert_eq!(store.get_or_compute(key(1), compute), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_day_change_ignored_without_daily_refresh() {
        let config = CacheConfig::new(3_600.0).unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 6, 15, 23, 50, 0).unwrap());
        let store: CacheStore<u32> =
            CacheStore::with_clock("hourly", config, Arc::new(clock.clone()));

        store.insert(key(1), 42);
        clock.set(Local.with_ymd_and_hms(2024, 6, 16, 0, 5, 0).unwrap());

        assert_eq!(store.lookup(&key(1)), Some(42));
    }

    #[test]
    fn test_null_not_reused_without_cache_none() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap().with_cache_none(false));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        };

        assert_eq!(store.get_or_compute(key(0), compute), None);
        assert_eq!(store.get_or_compute(key(0), compute), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_null_reused_with_cache_none() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        };

        assert_eq!(store.get_or_compute(key(0), compute), None);
        assert_eq!(store.get_or_compute(key(0), compute), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_null_reused_without_cache_none() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap().with_cache_none(false));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(3)
        };

        store.get_or_compute(key(3), compute);
        store.get_or_compute(key(3), compute);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);

        let first: Result<Option<u32>, String> = store.get_or_try_compute(key(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("rate limited".to_string())
        });
        assert_eq!(first, Err("rate limited".to_string()));
        assert!(store.is_empty());

        let second: Result<Option<u32>, String> = store.get_or_try_compute(key(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(5))
        });
        assert_eq!(second, Ok(Some(5)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_recompute_replaces_entry() {
        let (store, clock) = store_with(CacheConfig::new(10.0).unwrap().with_cache_none(false));
        store.insert(key(1), None);
        clock.advance(Duration::seconds(3));

        assert_eq!(store.get_or_compute(key(1), || Some(9)), Some(9));
        assert_eq!(store.len(), 1);

        // The new entry is stamped at recompute time, so it outlives the old one.
        clock.advance(Duration::seconds(8));
        assert_eq!(store.lookup(&key(1)), Some(Some(9)));
    }

    #[test]
    fn test_clear_forces_recompute() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(1)
        };

        store.get_or_compute(key(1), compute);
        store.clear();
        assert!(store.is_empty());
        store.get_or_compute(key(1), compute);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_trace_format_does_not_change_results() {
        let config = CacheConfig::new(10.0)
            .unwrap()
            .with_trace_format("returned cached value from {time}")
            .unwrap();
        let (store, _clock) = store_with(config);

        assert_eq!(store.get_or_compute(key(1), || Some(1)), Some(1));
        assert_eq!(store.get_or_compute(key(1), || Some(2)), Some(1));
    }

    #[test]
    fn test_entry_accessors() {
        let entry = CacheEntry::new(5u32, start_time());
        assert_eq!(*entry.value(), 5);
        assert_eq!(entry.timestamp(), start_time());
        assert!(!entry.is_expired(start_time(), Duration::seconds(1)));
        assert!(entry.is_expired(start_time() + Duration::seconds(2), Duration::seconds(1)));
    }

    #[tokio::test]
    async fn test_async_compute_once() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = store
                .get_or_compute_async(key(1), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some(11)
                })
                .await;
            assert_eq!(value, Some(11));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_errors_are_not_cached() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());

        let result: Result<Option<u32>, &str> = store
            .get_or_try_compute_async(key(1), || async { Err("timeout") })
            .await;
        assert_eq!(result, Err("timeout"));
        assert!(store.is_empty());

        let result: Result<Option<u32>, &str> = store
            .get_or_try_compute_async(key(1), || async { Ok(Some(2)) })
            .await;
        assert_eq!(result, Ok(Some(2)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_released_while_computing() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        store.insert(key(2), Some(2));

        let value = store
            .get_or_compute_async(key(1), || async {
                // A lookup from inside the computation would deadlock if the
                // table were still locked.
                assert_eq!(store.lookup(&key(2)), Some(Some(2)));
                Some(1)
            })
            .await;

        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_hit_emits_trace_message() {
        let config = CacheConfig::new(10.0)
            .unwrap()
            .with_trace_format("Use stored image (from {time})")
            .unwrap();
        let (store, clock) = store_with(config);
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            store.get_or_compute(key(1), || Some(1));
            clock.advance(Duration::seconds(3));
            store.get_or_compute(key(1), || Some(2));
        });

        let output = logs.contents();
        let expected = "iotcal_core::cache: Use stored image (from 2024-06-15 10:00:00.000000)";
        assert_eq!(output.matches("Use stored image").count(), 1, "{output}");
        assert!(output.contains(expected), "{output}");
    }

    #[test]
    fn test_concurrent_misses_both_compute() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        let results: Vec<Option<u32>> = thread::scope(|scope| {
            let handles: Vec<_> = [1u32, 2]
                .into_iter()
                .map(|n| {
                    let (store, calls, barrier) = (&store, &calls, &barrier);
                    scope.spawn(move || {
                        store.get_or_compute(key(1), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Neither thread stores until both have missed.
                            barrier.wait();
                            Some(n)
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(results, vec![Some(1), Some(2)]);
        assert_eq!(store.len(), 1);
        let stored = store.lookup(&key(1)).unwrap();
        assert!(stored == Some(1) || stored == Some(2), "{stored:?}");
    }

    #[test]
    fn test_poisoned_table_is_recovered() {
        let (store, _clock) = store_with(CacheConfig::new(10.0).unwrap());
        store.insert(key(1), Some(1));

        let crashed = panic::catch_unwind(AssertUnwindSafe(|| {
            let _table = store.table();
            panic!("holder crashed");
        }));
        assert!(crashed.is_err());
        assert!(store.table.is_poisoned());

        assert_eq!(store.lookup(&key(1)), Some(Some(1)));
        store.insert(key(2), Some(2));
        assert_eq!(store.get_or_compute(key(2), || None), Some(2));
        assert_eq!(store.len(), 2);
    }
}
