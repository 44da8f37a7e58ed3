use std::{env, str::FromStr};

use iotcal_core::cache::{CacheConfig, Result};

use crate::models::WeatherQuery;

const WEATHER_TRACE: &str = "Use stored weather data without calling the weather API (from {time})";
const IMAGE_TRACE: &str = "Use stored image without rendering (from {time})";

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Calendar listing TTL in seconds (default: 15)
    pub calendar_cache_seconds: f64,
    /// Weather forecast TTL in seconds (default: 600)
    pub weather_cache_seconds: f64,
    /// Rendered image TTL in seconds (default: 30 days)
    pub image_cache_seconds: f64,
    /// Calendar to list (default: "primary")
    pub calendar_id: String,
    /// Number of days shown on the dashboard (default: 14)
    pub dashboard_days: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Weather provider name (default: "openweathermap")
    pub weather_provider: String,
    pub weather_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CALENDAR_CACHE_SECONDS` - Calendar TTL in seconds (default: 15)
    /// - `WEATHER_CACHE_SECONDS` - Weather TTL in seconds (default: 600)
    /// - `IMAGE_CACHE_SECONDS` - Image TTL in seconds (default: 2,592,000)
    /// - `CALENDAR_ID` - Calendar to list (default: "primary")
    /// - `DASHBOARD_DAYS` - Days shown (default: 14)
    /// - `LATITUDE` / `LONGITUDE` - Forecast location (default: Berlin)
    /// - `WEATHER_PROVIDER` - Provider name (default: "openweathermap")
    /// - `WEATHER_API_KEY` - Provider key (default: empty)
    ///
    /// Unparsable values fall back to their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str| lookup(name).and_then(|v| parse(&v));
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Self {
            calendar_cache_seconds: parsed("CALENDAR_CACHE_SECONDS").unwrap_or(15.0),
            weather_cache_seconds: parsed("WEATHER_CACHE_SECONDS").unwrap_or(600.0),
            image_cache_seconds: parsed("IMAGE_CACHE_SECONDS").unwrap_or(2_592_000.0),
            calendar_id: text("CALENDAR_ID", "primary"),
            dashboard_days: lookup("DASHBOARD_DAYS")
                .and_then(|v| parse(&v))
                .unwrap_or(14),
            latitude: parsed("LATITUDE").unwrap_or(52.52),
            longitude: parsed("LONGITUDE").unwrap_or(13.405),
            weather_provider: text("WEATHER_PROVIDER", "openweathermap"),
            weather_api_key: text("WEATHER_API_KEY", ""),
        }
    }

    /// Cache settings for calendar listings.
    pub fn calendar_cache(&self) -> Result<CacheConfig> {
        CacheConfig::new(self.calendar_cache_seconds)
    }

    /// Cache settings for weather forecasts, refreshed at least once a day.
    pub fn weather_cache(&self) -> Result<CacheConfig> {
        Ok(CacheConfig::new(self.weather_cache_seconds)?
            .with_trace_format(WEATHER_TRACE)?
            .with_daily_refresh(true)
            .with_per_instance(true))
    }

    /// Cache settings for rendered images, refreshed at least once a day.
    pub fn image_cache(&self) -> Result<CacheConfig> {
        Ok(CacheConfig::new(self.image_cache_seconds)?
            .with_trace_format(IMAGE_TRACE)?
            .with_daily_refresh(true))
    }

    pub fn weather_query(&self) -> WeatherQuery {
        WeatherQuery::new(self.latitude, self.longitude).with_days(self.dashboard_days.min(5))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use iotcal_core::cache::CacheError;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.calendar_cache_seconds, 15.0);
        assert_eq!(config.weather_cache_seconds, 600.0);
        assert_eq!(config.image_cache_seconds, 2_592_000.0);
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.dashboard_days, 14);
        assert_eq!(config.latitude, 52.52);
        assert_eq!(config.longitude, 13.405);
        assert_eq!(config.weather_provider, "openweathermap");
        assert_eq!(config.weather_api_key, "");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CALENDAR_CACHE_SECONDS", "30"),
            ("CALENDAR_ID", "family"),
            ("DASHBOARD_DAYS", " 7 "),
            ("WEATHER_API_KEY", "abc"),
        ]);

        assert_eq!(config.calendar_cache_seconds, 30.0);
        assert_eq!(config.calendar_id, "family");
        assert_eq!(config.dashboard_days, 7);
        assert_eq!(config.weather_api_key, "abc");
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = config_from(&[("WEATHER_CACHE_SECONDS", "ten"), ("DASHBOARD_DAYS", "-1")]);

        assert_eq!(config.weather_cache_seconds, 600.0);
        assert_eq!(config.dashboard_days, 14);
    }

    #[test]
    fn test_cache_configs() {
        let config = Config::default();

        let calendar = config.calendar_cache().unwrap();
        assert_eq!(calendar.ttl().as_secs(), 15);
        assert!(!calendar.daily_refresh());

        let weather = config.weather_cache().unwrap();
        assert!(weather.daily_refresh());
        assert!(weather.per_instance());
        assert_eq!(weather.trace_format().map(|t| t.as_str()), Some(WEATHER_TRACE));

        let image = config.image_cache().unwrap();
        assert!(image.daily_refresh());
        assert!(!image.per_instance());
        assert_eq!(image.ttl().as_secs(), 2_592_000);
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let config = config_from(&[("CALENDAR_CACHE_SECONDS", "0")]);
        assert!(matches!(config.calendar_cache(), Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn test_weather_query_limits_days() {
        let query = Config::default().weather_query();
        assert_eq!(query.days, 5);
        assert_eq!(query.latitude, 52.52);
    }
}
