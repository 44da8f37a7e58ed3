//! Cache key derivation.
//!
//! A key is the SHA-256 digest of newline-separated lines describing the
//! call. Argument values are canonicalized into a `serde_json::Value`
//! first (see [`to_canonical_value`]): sequences keep their order and map
//! keys come out sorted, so `HashMap` arguments hash the same no matter
//! their iteration order. Values without a canonical form, such as NaN,
//! fail key derivation instead of sharing a key with another value.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::canonical::{to_canonical_value, CanonicalError};
use super::{CacheError, InstanceId, Result};

/// Opaque, deterministic cache key (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The receiver side of a method call.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverKey<'a> {
    /// Receiver type, so equal states of different types never collide.
    pub type_name: &'a str,
    /// Canonicalizable snapshot of the receiver's state.
    pub snapshot: &'a Value,
    /// Set only for per-instance caches.
    pub instance: Option<InstanceId>,
}

/// Returns the canonical text form of a value.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use iotcal_core::cache::canonicalize;
///
/// let mut a = HashMap::new();
/// a.insert("lat", 1);
/// a.insert("lon", 2);
///
/// assert_eq!(canonicalize(&a).unwrap(), r#"{"lat":1,"lon":2}"#);
/// assert_eq!(canonicalize(&(1, "x")).unwrap(), r#"[1,"x"]"#);
/// assert_eq!(canonicalize(&Some(2)).unwrap(), r#"{"Some":2}"#);
/// assert!(canonicalize(&f64::NAN).is_err());
/// ```
pub fn canonicalize<T>(value: &T) -> std::result::Result<String, CanonicalError>
where
    T: Serialize + ?Sized,
{
    let value = to_canonical_value(value)?;
    serde_json::to_string(&value).map_err(ser_error)
}

/// Derives the key for a call to `name` with `args`.
///
/// Positional arguments are passed as a tuple, named arguments as a struct.
/// Methods pass their receiver; free functions pass `None`.
pub fn derive_key<A: Serialize + ?Sized>(
    name: &str,
    receiver: Option<&ReceiverKey<'_>>,
    args: &A,
) -> Result<CacheKey> {
    let args = canonicalize(args).map_err(|e| key_error(name, "arguments", &e))?;

    let lines = match receiver {
        None => vec!["fn".to_string(), name.to_string(), args],
        Some(receiver) => {
            let snapshot = serde_json::to_string(receiver.snapshot)
                .map_err(|e| key_error(name, "receiver state", &e))?;
            let instance = receiver
                .instance
                .map(|id| id.to_string())
                .unwrap_or_default();
            vec![
                "method".to_string(),
                instance,
                receiver.type_name.to_string(),
                name.to_string(),
                snapshot,
                args,
            ]
        }
    };

    Ok(digest(&lines.join("\n")))
}

/// Default receiver snapshot: the receiver's `Serialize` form.
pub fn serialize_snapshot<R: Serialize>(receiver: &R) -> Result<Value> {
    to_canonical_value(receiver).map_err(|e| CacheError::KeyDerivation {
        name: std::any::type_name::<R>().to_string(),
        reason: format!("receiver state is not serializable: {e}"),
    })
}

fn digest(text: &str) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    CacheKey(hex::encode(hasher.finalize()))
}

fn ser_error(err: serde_json::Error) -> CanonicalError {
    <CanonicalError as serde::ser::Error>::custom(err)
}

fn key_error(name: &str, what: &str, err: &impl Display) -> CacheError {
    CacheError::KeyDerivation {
        name: name.to_string(),
        reason: format!("{what} have no canonical form: {err}"),
    }
}
