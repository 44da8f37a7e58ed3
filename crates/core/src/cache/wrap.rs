//! Signature-preserving wrapper around a function body.

use std::fmt;

use serde::Serialize;

use super::{CacheConfig, FunctionCache, Nullable, Result};

/// A function body bundled with its cache.
///
/// `call` takes the same argument tuple the body takes and returns the
/// body's result, computed at most once per key within the TTL.
///
/// # Examples
///
/// ```
/// use iotcal_core::cache::{CacheConfig, CachedFn};
///
/// let square = CachedFn::new("square", CacheConfig::new(60.0).unwrap(), |(x,): (u64,)| x * x);
///
/// assert_eq!(square.call((12,)).unwrap(), 144);
/// assert_eq!(square.name(), "square");
/// ```
pub struct CachedFn<A, T, F> {
    cache: FunctionCache<A, T>,
    func: F,
}

impl<A, T, F> CachedFn<A, T, F>
where
    A: Serialize,
    T: Clone + Nullable,
    F: Fn(A) -> T,
{
    pub fn new(name: impl Into<String>, config: CacheConfig, func: F) -> Self {
        Self::with_cache(FunctionCache::new(name, config), func)
    }

    pub fn bare(name: impl Into<String>, func: F) -> Self {
        Self::new(name, CacheConfig::default(), func)
    }

    pub fn with_cache(cache: FunctionCache<A, T>, func: F) -> Self {
        Self { cache, func }
    }

    pub fn call(&self, args: A) -> Result<T> {
        let key = self.cache.key(&args)?;
        Ok(self.cache.store().get_or_compute(key, || (self.func)(args)))
    }

    pub fn clear_cache(&self) {
        self.cache.clear_cache();
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    pub fn cache(&self) -> &FunctionCache<A, T> {
        &self.cache
    }
}

impl<A, T, F> fmt::Debug for CachedFn<A, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFn").field("cache", &self.cache).finish()
    }
}
