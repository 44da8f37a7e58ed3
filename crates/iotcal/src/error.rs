use iotcal_core::cache::CacheError;
use thiserror::Error;

/// Errors from the dashboard's data sources.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Calendar request failed: {0}")]
    Calendar(String),
    #[error("Weather request failed: {0}")]
    Weather(String),
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for data source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
