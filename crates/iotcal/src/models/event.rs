use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A calendar event as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub date: NaiveDate,
    /// `None` for all-day events.
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl CalendarEvent {
    /// Creates an all-day event.
    pub fn all_day(summary: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            summary: summary.into(),
            date,
            start: None,
            end: None,
        }
    }

    /// Creates a timed event.
    pub fn timed(
        summary: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            summary: summary.into(),
            date,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_none()
    }
}
