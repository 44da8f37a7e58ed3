//! Cache front-end for free functions.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use super::{derive_key, CacheConfig, CacheError, CacheKey, CacheStore, Nullable, Result};

/// Memoizes calls to one free function.
///
/// Arguments are passed as a tuple (or any `Serialize` value) and hashed
/// into the key; the function body is supplied as a closure and only runs
/// on a miss. Clones share the same table.
///
/// # Examples
///
/// ```
/// use iotcal_core::cache::{CacheConfig, FunctionCache};
///
/// let cache: FunctionCache<(i32, i32), i32> =
///     FunctionCache::new("add", CacheConfig::new(0.1).unwrap());
///
/// let add = |x: i32, y: i32| cache.call(&(x, y), || x + y);
///
/// assert_eq!(add(1, 2).unwrap(), 3);
/// assert_eq!(cache.call(&(1, 2), || unreachable!()).unwrap(), 3);
/// ```
pub struct FunctionCache<A: ?Sized, T> {
    store: Arc<CacheStore<T>>,
    _args: PhantomData<fn(&A)>,
}

impl<A: ?Sized, T> Clone for FunctionCache<A, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _args: PhantomData,
        }
    }
}

impl<A: ?Sized, T> fmt::Debug for FunctionCache<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCache")
            .field("store", &self.store)
            .finish()
    }
}

impl<A, T> FunctionCache<A, T>
where
    A: Serialize + ?Sized,
    T: Clone + Nullable,
{
    /// Creates a cache for the function `name`.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self::from_store(Arc::new(CacheStore::new(name, config)))
    }

    /// Creates a cache with the default configuration.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, CacheConfig::default())
    }

    /// Wraps an existing store, e.g. one driven by a manual clock.
    pub fn from_store(store: Arc<CacheStore<T>>) -> Self {
        Self {
            store,
            _args: PhantomData,
        }
    }

    /// Name of the wrapped function.
    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn config(&self) -> &CacheConfig {
        self.store.config()
    }

    pub(crate) fn store(&self) -> &CacheStore<T> {
        &self.store
    }

    /// Key a call with `args` maps to.
    pub fn key(&self, args: &A) -> Result<CacheKey> {
        derive_key(self.store.name(), None, args)
    }

    /// Returns the cached result for `args`, running `compute` on a miss.
    pub fn call<F>(&self, args: &A, compute: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let key = self.key(args)?;
        Ok(self.store.get_or_compute(key, compute))
    }

    /// Like [`call`](Self::call) for fallible functions. Errors from
    /// `compute` come back unchanged and are not cached.
    pub fn try_call<E, F>(&self, args: &A, compute: F) -> std::result::Result<T, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let key = self.key(args)?;
        self.store.get_or_try_compute(key, compute)
    }

    pub async fn call_async<F, Fut>(&self, args: &A, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = self.key(args)?;
        Ok(self.store.get_or_compute_async(key, compute).await)
    }

    pub async fn try_call_async<E, F, Fut>(&self, args: &A, compute: F) -> std::result::Result<T, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key(args)?;
        self.store.get_or_try_compute_async(key, compute).await
    }

    /// Empties the table; the next call computes again.
    pub fn clear_cache(&self) {
        self.store.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
