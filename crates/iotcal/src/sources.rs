//! Data sources the dashboard is drawn from.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CalendarEvent, DashboardImage, DashboardInputs, WeatherForecast, WeatherQuery};

/// Lists upcoming calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events of `calendar_id` for the next `days` days.
    async fn list_events(&self, calendar_id: &str, days: u32) -> Result<Vec<CalendarEvent>>;
}

/// Looks up weather forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Returns `None` when the provider has no data for the query.
    async fn fetch(&self, query: &WeatherQuery) -> Result<Option<WeatherForecast>>;
}

/// Draws the dashboard image.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, inputs: &DashboardInputs) -> Result<DashboardImage>;
}

/// Sources that keep a cache expose a way to drop it.
pub trait ClearCache: Send + Sync {
    fn clear_cache(&self);
}
