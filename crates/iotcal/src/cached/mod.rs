//! Cached data source decorators.
//!
//! Each decorator implements the same trait as the source it wraps and
//! consults its cache before calling through:
//!
//! - **Hit**: return the stored value without touching the source
//! - **Miss**: call the source, store the result, return it
//! - **Error**: return the source's error; nothing is stored, so the next
//!   call tries the source again
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use iotcal::cached::CachedCalendarSource;
//! use iotcal::mock_data::MockCalendar;
//! use iotcal_core::cache::CacheConfig;
//!
//! let calendar = Arc::new(MockCalendar::new());
//! let cached = CachedCalendarSource::new(calendar, CacheConfig::new(15.0).unwrap());
//! ```

mod calendar;
mod renderer;
mod weather;

pub use calendar::CachedCalendarSource;
pub use renderer::CachedImageRenderer;
pub use weather::{CachedWeatherSource, WeatherCache};
