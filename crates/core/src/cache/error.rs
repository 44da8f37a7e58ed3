use thiserror::Error;

/// Errors raised by the cache layer itself.
///
/// Failures of the wrapped computation never show up here; they are
/// returned to the caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Invalid cache TTL: {0}")]
    InvalidTtl(String),
    #[error("Invalid trace format {format:?}: {reason}")]
    InvalidTraceFormat { format: String, reason: String },
    #[error("Cannot derive cache key for {name}: {reason}")]
    KeyDerivation { name: String, reason: String },
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_ttl_display() {
        let error = CacheError::InvalidTtl("must be positive, got 0".to_string());
        assert_eq!(error.to_string(), "Invalid cache TTL: must be positive, got 0");
    }

    #[test]
    fn test_invalid_trace_format_display() {
        let error = CacheError::InvalidTraceFormat {
            format: "cached {when}".to_string(),
            reason: "unknown placeholder {when}".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid trace format \"cached {when}\": unknown placeholder {when}"
        );
    }

    #[test]
    fn test_key_derivation_display() {
        let error = CacheError::KeyDerivation {
            name: "get_weather".to_string(),
            reason: "key must be a string".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot derive cache key for get_weather: key must be a string"
        );
    }
}
