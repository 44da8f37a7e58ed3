use chrono::{DateTime, Local, NaiveDate};
use iotcal_core::cache::Nullable;
use serde::Serialize;

use super::{CalendarEvent, WeatherForecast};

/// Everything a dashboard image is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardInputs {
    pub today: NaiveDate,
    pub events: Vec<CalendarEvent>,
    pub weather: Option<WeatherForecast>,
}

/// A rendered dashboard image.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardImage {
    pub png: Vec<u8>,
    pub rendered_at: DateTime<Local>,
}

impl Nullable for DashboardImage {}
