//! Cache front-end for methods.
//!
//! One `MethodCache` belongs to one method declaration and is shared by
//! every receiver; the receiver is passed on each call. By default the key
//! covers the receiver's state, so two receivers with equal state share
//! entries. With `per_instance` the receiver's [`InstanceId`] is folded in
//! and no two receivers ever share an entry.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{
    derive_key, serialize_snapshot, CacheConfig, CacheError, CacheKey, CacheStore, Identified,
    InstanceId, Nullable, ReceiverKey, Result,
};

/// Produces the part of a receiver that takes part in cache keys.
pub type SnapshotFn<R> = fn(&R) -> Result<Value>;

/// Memoizes calls to one method.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use iotcal_core::cache::{CacheConfig, Identified, InstanceId, MethodCache};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Scaler {
///     factor: u32,
///     #[serde(skip)]
///     id: InstanceId,
/// }
///
/// impl Identified for Scaler {
///     fn instance_id(&self) -> InstanceId {
///         self.id
///     }
/// }
///
/// static SCALE: LazyLock<MethodCache<Scaler, (u32,), u32>> =
///     LazyLock::new(|| MethodCache::bare("Scaler::scale"));
///
/// impl Scaler {
///     fn scale(&self, n: u32) -> u32 {
///         SCALE.call(self, &(n,), || n * self.factor).unwrap_or(n * self.factor)
///     }
/// }
///
/// let a = Scaler { factor: 10, id: InstanceId::new() };
/// let b = Scaler { factor: 10, id: InstanceId::new() };
/// assert_eq!(a.scale(5), 50);
/// assert_eq!(b.scale(5), 50);
/// assert_eq!(SCALE.len(), 1);
/// ```
pub struct MethodCache<R, A: ?Sized, T> {
    store: Arc<CacheStore<T>>,
    snapshot: SnapshotFn<R>,
    _call: PhantomData<fn(&R, &A)>,
}

impl<R, A: ?Sized, T> Clone for MethodCache<R, A, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            snapshot: self.snapshot,
            _call: PhantomData,
        }
    }
}

impl<R, A: ?Sized, T> fmt::Debug for MethodCache<R, A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCache")
            .field("receiver", &std::any::type_name::<R>())
            .field("store", &self.store)
            .finish()
    }
}

impl<R, A, T> MethodCache<R, A, T>
where
    R: Serialize + Identified,
    A: Serialize + ?Sized,
    T: Clone + Nullable,
{
    /// Creates a cache whose keys cover the receiver's serialized state.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self::with_snapshot(name, config, serialize_snapshot::<R>)
    }

    /// Creates a cache with the default configuration.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, CacheConfig::default())
    }
}

impl<R, A, T> MethodCache<R, A, T>
where
    R: Identified,
    A: Serialize + ?Sized,
    T: Clone + Nullable,
{
    /// Creates a cache that keys receivers by a custom snapshot.
    pub fn with_snapshot(
        name: impl Into<String>,
        config: CacheConfig,
        snapshot: SnapshotFn<R>,
    ) -> Self {
        Self::from_store(Arc::new(CacheStore::new(name, config)), snapshot)
    }

    /// Wraps an existing store, e.g. one driven by a manual clock.
    pub fn from_store(store: Arc<CacheStore<T>>, snapshot: SnapshotFn<R>) -> Self {
        Self {
            store,
            snapshot,
            _call: PhantomData,
        }
    }

    /// Name of the wrapped method.
    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn config(&self) -> &CacheConfig {
        self.store.config()
    }

    /// Key a call on `receiver` with `args` maps to.
    pub fn key(&self, receiver: &R, args: &A) -> Result<CacheKey> {
        let snapshot = (self.snapshot)(receiver).map_err(|err| match err {
            CacheError::KeyDerivation { reason, .. } => CacheError::KeyDerivation {
                name: self.store.name().to_string(),
                reason,
            },
            other => other,
        })?;
        let instance: Option<InstanceId> = self
            .store
            .config()
            .per_instance()
            .then(|| receiver.instance_id());

        let receiver = ReceiverKey {
            type_name: std::any::type_name::<R>(),
            snapshot: &snapshot,
            instance,
        };
        derive_key(self.store.name(), Some(&receiver), args)
    }

    /// Returns the cached result for `receiver` and `args`, running
    /// `compute` on a miss.
    pub fn call<F>(&self, receiver: &R, args: &A, compute: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let key = self.key(receiver, args)?;
        Ok(self.store.get_or_compute(key, compute))
    }

    /// Like [`call`](Self::call) for fallible methods. Errors from `compute`
    /// come back unchanged and are not cached.
    pub fn try_call<E, F>(&self, receiver: &R, args: &A, compute: F) -> std::result::Result<T, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let key = self.key(receiver, args)?;
        self.store.get_or_try_compute(key, compute)
    }

    pub async fn call_async<F, Fut>(&self, receiver: &R, args: &A, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = self.key(receiver, args)?;
        Ok(self.store.get_or_compute_async(key, compute).await)
    }

    pub async fn try_call_async<E, F, Fut>(
        &self,
        receiver: &R,
        args: &A,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key(receiver, args)?;
        self.store.get_or_try_compute_async(key, compute).await
    }

    /// Empties the table for every receiver.
    pub fn clear_cache(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
