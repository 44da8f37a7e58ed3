//! Cache configuration with validation.

use std::time::Duration;

use super::{CacheError, Result, TraceFormat};

/// TTL used by bare caches.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Immutable configuration of one cache (validated).
///
/// Everything that can be wrong with a configuration is caught by the
/// constructors and `with_trace_format`, before any call goes through the
/// cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
    trace_format: Option<TraceFormat>,
    daily_refresh: bool,
    per_instance: bool,
    cache_none: bool,
}

impl CacheConfig {
    /// Creates a config with a TTL given in (fractional) seconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use iotcal_core::cache::CacheConfig;
    ///
    /// let config = CacheConfig::new(0.05).unwrap();
    /// assert_eq!(config.ttl().as_millis(), 50);
    ///
    /// assert!(CacheConfig::new(0.0).is_err());
    /// assert!(CacheConfig::new(-1.0).is_err());
    /// assert!(CacheConfig::new(f64::NAN).is_err());
    /// ```
    pub fn new(ttl_seconds: f64) -> Result<Self> {
        if !ttl_seconds.is_finite() || ttl_seconds <= 0.0 {
            return Err(CacheError::InvalidTtl(format!(
                "must be a positive number of seconds, got {ttl_seconds}"
            )));
        }
        let ttl = Duration::try_from_secs_f64(ttl_seconds)
            .map_err(|e| CacheError::InvalidTtl(format!("{ttl_seconds}s: {e}")))?;
        Self::from_ttl(ttl)
    }

    /// Creates a config from a TTL duration.
    pub fn from_ttl(ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl("must be greater than zero".to_string()));
        }
        // Ages are measured with chrono, which has a narrower range.
        chrono::Duration::from_std(ttl)
            .map_err(|_| CacheError::InvalidTtl(format!("{ttl:?} is out of range")))?;

        Ok(Self {
            ttl,
            trace_format: None,
            daily_refresh: false,
            per_instance: false,
            cache_none: true,
        })
    }

    /// Emits `format` (with `{time}` replaced by the entry's timestamp) on
    /// every cache hit.
    pub fn with_trace_format(mut self, format: &str) -> Result<Self> {
        self.trace_format = Some(TraceFormat::parse(format)?);
        Ok(self)
    }

    /// Recompute at most once per calendar day, even inside the TTL.
    pub fn with_daily_refresh(mut self, daily_refresh: bool) -> Self {
        self.daily_refresh = daily_refresh;
        self
    }

    /// Scope method cache entries to the receiver's identity instead of its
    /// state.
    pub fn with_per_instance(mut self, per_instance: bool) -> Self {
        self.per_instance = per_instance;
        self
    }

    /// Whether null results may be reused.
    pub fn with_cache_none(mut self, cache_none: bool) -> Self {
        self.cache_none = cache_none;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn trace_format(&self) -> Option<&TraceFormat> {
        self.trace_format.as_ref()
    }

    pub fn daily_refresh(&self) -> bool {
        self.daily_refresh
    }

    pub fn per_instance(&self) -> bool {
        self.per_instance
    }

    pub fn cache_none(&self) -> bool {
        self.cache_none
    }

    pub(crate) fn chrono_ttl(&self) -> chrono::Duration {
        // Range checked in `from_ttl`.
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            trace_format: None,
            daily_refresh: false,
            per_instance: false,
            cache_none: true,
        }
    }
}
