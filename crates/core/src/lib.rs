//! Core of the iotcal dashboard: the memoization cache that bounds how often
//! calendar, weather and rendering calls actually run.
//!
//! # Example
//!
//! ```
//! use iotcal_core::cache::{CacheConfig, FunctionCache};
//!
//! let config = CacheConfig::new(15.0)
//!     .unwrap()
//!     .with_trace_format("Use stored events (from {time})")
//!     .unwrap();
//! let events: FunctionCache<(&str, u32), Vec<String>> = FunctionCache::new("list_events", config);
//!
//! let first = events.call(&("primary", 14), || vec!["Standup".to_string()]).unwrap();
//! let second = events.call(&("primary", 14), || unreachable!()).unwrap();
//! assert_eq!(first, second);
//! ```

pub mod cache;
