//! Time-bounded memoization.
//!
//! Wrap a free function with [`FunctionCache`] (or [`CachedFn`] to keep the
//! body alongside the cache) and a method with [`MethodCache`]. Each holds
//! one [`CacheStore`] configured by a [`CacheConfig`]; keys come from
//! [`derive_key`].

mod canonical;
mod clock;
mod config;
mod error;
mod function;
mod instance;
mod keys;
mod method;
mod store;
mod trace;
mod value;
mod wrap;

pub use canonical::{to_canonical_value, CanonicalError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_TTL};
pub use error::{CacheError, Result};
pub use function::FunctionCache;
pub use instance::{Identified, InstanceId};
pub use keys::{canonicalize, derive_key, serialize_snapshot, CacheKey, ReceiverKey};
pub use method::{MethodCache, SnapshotFn};
pub use store::{CacheEntry, CacheStore};
pub use trace::{TraceFormat, DEFAULT_TIME_FORMAT};
pub use value::Nullable;
pub use wrap::CachedFn;
