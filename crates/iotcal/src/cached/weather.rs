//! Cached weather source decorator.

use std::sync::Arc;

use async_trait::async_trait;
use iotcal_core::cache::{CacheConfig, Identified, MethodCache};
use serde::Serialize;

use crate::error::Result;
use crate::models::{WeatherForecast, WeatherQuery};
use crate::sources::{ClearCache, WeatherSource};

/// Method cache type shared by every decorated source of one type.
pub type WeatherCache<S> = MethodCache<S, WeatherQuery, Option<WeatherForecast>>;

/// Caches forecasts per source.
///
/// The wrapped source is the receiver of the cached method: its serialized
/// settings take part in the key, and with `per_instance` its identity does
/// too. Several decorators can share one [`WeatherCache`] through
/// [`with_cache`](Self::with_cache).
pub struct CachedWeatherSource<S> {
    source: Arc<S>,
    cache: WeatherCache<S>,
}

impl<S> CachedWeatherSource<S>
where
    S: WeatherSource + Serialize + Identified,
{
    pub fn new(source: Arc<S>, config: CacheConfig) -> Self {
        Self::with_cache(source, MethodCache::new("WeatherSource::fetch", config))
    }
}

impl<S> CachedWeatherSource<S>
where
    S: WeatherSource + Identified,
{
    pub fn with_cache(source: Arc<S>, cache: WeatherCache<S>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &WeatherCache<S> {
        &self.cache
    }
}

#[async_trait]
impl<S> WeatherSource for CachedWeatherSource<S>
where
    S: WeatherSource + Identified + 'static,
{
    async fn fetch(&self, query: &WeatherQuery) -> Result<Option<WeatherForecast>> {
        self.cache
            .try_call_async(self.source.as_ref(), query, || self.source.fetch(query))
            .await
    }
}

impl<S> ClearCache for CachedWeatherSource<S>
where
    S: WeatherSource + Identified,
{
    fn clear_cache(&self) {
        self.cache.clear_cache();
    }
}
