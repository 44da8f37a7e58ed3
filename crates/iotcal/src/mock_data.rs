//! Mock data sources for demonstration and tests.
//!
//! Each source counts how often it is actually invoked, which is what the
//! cached decorators are meant to keep low.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use iotcal_core::cache::{Identified, InstanceId};
use serde::Serialize;

use crate::error::{Result, SourceError};
use crate::models::{CalendarEvent, DashboardImage, DashboardInputs, WeatherForecast, WeatherQuery};
use crate::sources::{CalendarSource, ImageRenderer, WeatherSource};

/// Generates mock events spread across the days around `center_date`.
pub fn generate_mock_events(center_date: NaiveDate) -> Vec<CalendarEvent> {
    let time = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);

    vec![
        CalendarEvent::all_day("Public Holiday", center_date - Duration::days(2)),
        CalendarEvent::timed("Standup Meeting", center_date, time(9, 0), time(9, 30)),
        CalendarEvent::timed("Dentist", center_date, time(15, 0), time(16, 0)),
        CalendarEvent::all_day("Sarah's Birthday", center_date + Duration::days(2)),
        CalendarEvent::timed(
            "Piano Lesson",
            center_date + Duration::days(3),
            time(17, 30),
            time(18, 15),
        ),
    ]
}

/// Calendar source returning [`generate_mock_events`].
#[derive(Debug, Default)]
pub struct MockCalendar {
    calls: AtomicUsize,
    failures: AtomicUsize,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for MockCalendar {
    async fn list_events(&self, calendar_id: &str, days: u32) -> Result<Vec<CalendarEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SourceError::Calendar(format!(
                "rate limit exceeded for calendar {calendar_id}"
            )));
        }

        let today = Local::now().date_naive();
        let last_day = today + Duration::days(i64::from(days));
        Ok(generate_mock_events(today)
            .into_iter()
            .filter(|event| event.date >= today - Duration::days(2) && event.date <= last_day)
            .collect())
    }
}

/// Weather source with provider settings as its cache-relevant state.
#[derive(Debug, Serialize)]
pub struct MockWeather {
    pub provider: String,
    pub api_key: String,
    #[serde(skip)]
    id: InstanceId,
    #[serde(skip)]
    calls: AtomicUsize,
    #[serde(skip)]
    no_data: bool,
}

impl MockWeather {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            id: InstanceId::new(),
            calls: AtomicUsize::new(0),
            no_data: false,
        }
    }

    /// A source that answers every query with "no data".
    pub fn without_data(mut self) -> Self {
        self.no_data = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Identified for MockWeather {
    fn instance_id(&self) -> InstanceId {
        self.id
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn fetch(&self, query: &WeatherQuery) -> Result<Option<WeatherForecast>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.no_data {
            return Ok(None);
        }

        let start = Local::now().date_naive().and_time(NaiveTime::MIN);
        let steps = query.days.max(1) * 8;
        let times = (0..steps)
            .map(|step| start + Duration::hours(3 * i64::from(step)))
            .collect();
        let temperatures = (0..steps)
            .map(|step| 12.0 + f64::from(step % 8) - query.latitude.abs() / 10.0)
            .collect();
        let icons = (0..steps)
            .map(|step| if step % 8 < 4 { "clear" } else { "clouds" }.to_string())
            .collect();

        Ok(Some(WeatherForecast {
            temperatures,
            icons,
            times,
        }))
    }
}

/// Renderer producing a small textual stand-in for the image.
#[derive(Debug, Default)]
pub struct MockRenderer {
    calls: AtomicUsize,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageRenderer for MockRenderer {
    async fn render(&self, inputs: &DashboardInputs) -> Result<DashboardImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let png = serde_json::to_vec(inputs).map_err(|e| SourceError::Render(e.to_string()))?;
        Ok(DashboardImage {
            png,
            rendered_at: Local::now(),
        })
    }
}
