//! Cached calendar source decorator.

use std::sync::Arc;

use async_trait::async_trait;
use iotcal_core::cache::{CacheConfig, FunctionCache};

use crate::error::Result;
use crate::models::CalendarEvent;
use crate::sources::{CalendarSource, ClearCache};

/// Keeps calendar listings for a short while so dashboard refreshes stay
/// inside the provider's rate limits.
pub struct CachedCalendarSource<S> {
    source: Arc<S>,
    cache: FunctionCache<(String, u32), Vec<CalendarEvent>>,
}

impl<S: CalendarSource> CachedCalendarSource<S> {
    pub fn new(source: Arc<S>, config: CacheConfig) -> Self {
        Self::with_cache(source, FunctionCache::new("CalendarSource::list_events", config))
    }

    pub fn with_cache(
        source: Arc<S>,
        cache: FunctionCache<(String, u32), Vec<CalendarEvent>>,
    ) -> Self {
        Self { source, cache }
    }
}

#[async_trait]
impl<S> CalendarSource for CachedCalendarSource<S>
where
    S: CalendarSource + 'static,
{
    async fn list_events(&self, calendar_id: &str, days: u32) -> Result<Vec<CalendarEvent>> {
        let args = (calendar_id.to_string(), days);
        self.cache
            .try_call_async(&args, || self.source.list_events(calendar_id, days))
            .await
    }
}

impl<S: CalendarSource> ClearCache for CachedCalendarSource<S> {
    fn clear_cache(&self) {
        self.cache.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::mock_data::MockCalendar;

    fn cached(calendar: &Arc<MockCalendar>) -> CachedCalendarSource<MockCalendar> {
        CachedCalendarSource::new(calendar.clone(), CacheConfig::new(15.0).unwrap())
    }

    #[tokio::test]
    async fn test_list_events_cache_miss_then_hit() {
        let calendar = Arc::new(MockCalendar::new());
        let cached = cached(&calendar);

        let first = cached.list_events("primary", 14).await.unwrap();
        assert_eq!(calendar.calls(), 1);

        let second = cached.list_events("primary", 14).await.unwrap();
        assert_eq!(calendar.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_arguments_miss() {
        let calendar = Arc::new(MockCalendar::new());
        let cached = cached(&calendar);

        cached.list_events("primary", 14).await.unwrap();
        cached.list_events("primary", 7).await.unwrap();
        cached.list_events("holidays", 14).await.unwrap();

        assert_eq!(calendar.calls(), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let calendar = Arc::new(MockCalendar::new());
        let cached = cached(&calendar);
        calendar.fail_next(1);

        let result = cached.list_events("primary", 14).await;
        assert!(matches!(result, Err(SourceError::Calendar(_))));

        assert!(cached.list_events("primary", 14).await.is_ok());
        assert!(cached.list_events("primary", 14).await.is_ok());
        assert_eq!(calendar.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_calls_through() {
        let calendar = Arc::new(MockCalendar::new());
        let cached = cached(&calendar);

        cached.list_events("primary", 14).await.unwrap();
        cached.clear_cache();
        cached.list_events("primary", 14).await.unwrap();

        assert_eq!(calendar.calls(), 2);
    }
}
