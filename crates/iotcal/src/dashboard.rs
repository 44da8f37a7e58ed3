//! Dashboard service composing the cached data sources.

use std::sync::Arc;

use iotcal_core::cache::{CacheError, Clock, Identified, SystemClock};
use serde::Serialize;

use crate::cached::{CachedCalendarSource, CachedImageRenderer, CachedWeatherSource};
use crate::config::Config;
use crate::error::Result;
use crate::models::{DashboardImage, DashboardInputs, WeatherQuery};
use crate::sources::{CalendarSource, ClearCache, ImageRenderer, WeatherSource};

/// Draws the dashboard from its calendar, weather and renderer sources.
pub struct Dashboard {
    calendar: Arc<dyn CalendarSource>,
    weather: Arc<dyn WeatherSource>,
    renderer: Arc<dyn ImageRenderer>,
    caches: Vec<Arc<dyn ClearCache>>,
    calendar_id: String,
    days: u32,
    query: WeatherQuery,
    clock: Arc<dyn Clock>,
}

impl Dashboard {
    /// Wraps each source in its cached decorator, configured from `config`.
    ///
    /// Invalid cache settings are reported here, before the first refresh.
    pub fn cached<C, W, R>(
        config: &Config,
        calendar: Arc<C>,
        weather: Arc<W>,
        renderer: Arc<R>,
    ) -> std::result::Result<Self, CacheError>
    where
        C: CalendarSource + 'static,
        W: WeatherSource + Serialize + Identified + 'static,
        R: ImageRenderer + 'static,
    {
        let calendar = Arc::new(CachedCalendarSource::new(calendar, config.calendar_cache()?));
        let weather = Arc::new(CachedWeatherSource::new(weather, config.weather_cache()?));
        let renderer = Arc::new(CachedImageRenderer::new(renderer, config.image_cache()?));

        let caches: Vec<Arc<dyn ClearCache>> =
            vec![calendar.clone(), weather.clone(), renderer.clone()];

        Ok(Self {
            caches,
            calendar,
            weather,
            renderer,
            calendar_id: config.calendar_id.clone(),
            days: config.dashboard_days,
            query: config.weather_query(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Uses `clock` to decide which day the dashboard shows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Collects the inputs and renders the image.
    ///
    /// A failing weather lookup leaves the forecast out instead of failing
    /// the refresh.
    pub async fn refresh(&self) -> Result<DashboardImage> {
        let events = self.calendar.list_events(&self.calendar_id, self.days).await?;

        let weather = match self.weather.fetch(&self.query).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(error = %e, "weather unavailable, rendering without forecast");
                None
            }
        };

        let inputs = DashboardInputs {
            today: self.clock.now().date_naive(),
            events,
            weather,
        };
        tracing::debug!(
            events = inputs.events.len(),
            weather = inputs.weather.is_some(),
            "rendering dashboard"
        );

        self.renderer.render(&inputs).await
    }

    /// Drops every cached listing, forecast and image.
    pub fn clear_caches(&self) {
        for cache in &self.caches {
            cache.clear_cache();
        }
        tracing::debug!(caches = self.caches.len(), "dashboard caches cleared");
    }
}
