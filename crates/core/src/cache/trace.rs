//! Hit trace templates.
//!
//! A template is plain text with `{time}` placeholders. `{time:<strftime>}`
//! selects a custom timestamp layout, `{{` and `}}` render literal braces.
//! Anything else between braces is rejected when the template is parsed, so
//! a bad template fails while the cache is being configured rather than on
//! the first hit.

use std::fmt;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use super::{CacheError, Result};

/// Layout used for a bare `{time}` placeholder.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Time(Option<String>),
}

/// A validated trace template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFormat {
    source: String,
    segments: Vec<Segment>,
}

impl TraceFormat {
    /// Parses and validates a template.
    ///
    /// # Examples
    ///
    /// ```
    /// use iotcal_core::cache::TraceFormat;
    ///
    /// assert!(TraceFormat::parse("cached at {time}").is_ok());
    /// assert!(TraceFormat::parse("cached at {time:%H:%M}").is_ok());
    /// assert!(TraceFormat::parse("{{literal}} braces").is_ok());
    ///
    /// assert!(TraceFormat::parse("cached at {when}").is_err());
    /// assert!(TraceFormat::parse("cached at {time").is_err());
    /// ```
    pub fn parse(format: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(invalid(format, "unclosed '{'")),
                            Some(c) => field.push(c),
                        }
                    }
                    let placeholder = parse_placeholder(format, &field)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(placeholder);
                }
                '}' => return Err(invalid(format, "unmatched '}'")),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    /// Renders the template with `time` substituted for every placeholder.
    pub fn render(&self, time: &DateTime<Local>) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Time(layout) => {
                    let layout = layout.as_deref().unwrap_or(DEFAULT_TIME_FORMAT);
                    out.push_str(&time.format(layout).to_string());
                }
            }
        }
        out
    }

    /// The template as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_placeholder(format: &str, field: &str) -> Result<Segment> {
    if field == "time" {
        return Ok(Segment::Time(None));
    }

    let Some(layout) = field.strip_prefix("time:") else {
        return Err(invalid(format, format!("unknown placeholder {{{field}}}")));
    };

    if layout.is_empty() || StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(invalid(format, format!("bad time layout {layout:?}")));
    }

    Ok(Segment::Time(Some(layout.to_string())))
}

fn invalid(format: &str, reason: impl Into<String>) -> CacheError {
    CacheError::InvalidTraceFormat {
        format: format.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 6, 15, 9, 30, 5)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_render_default_layout() {
        let format = TraceFormat::parse("cached at {time}").unwrap();
        assert_eq!(
            format.render(&fixed_time()),
            "cached at 2024-06-15 09:30:05.000000"
        );
    }

    #[test]
    fn test_render_custom_layout() {
        let format = TraceFormat::parse("[{time:%H:%M}] hit").unwrap();
        assert_eq!(format.render(&fixed_time()), "[09:30] hit");
    }

    #[test]
    fn test_render_without_placeholder() {
        let format = TraceFormat::parse("weather from cache").unwrap();
        assert_eq!(format.render(&fixed_time()), "weather from cache");
    }

    #[test]
    fn test_escaped_braces() {
        let format = TraceFormat::parse("{{time}} is {time:%Y}").unwrap();
        assert_eq!(format.render(&fixed_time()), "{time} is 2024");
    }

    #[test]
    fn test_repeated_placeholder() {
        let format = TraceFormat::parse("{time:%d}/{time:%m}").unwrap();
        assert_eq!(format.render(&fixed_time()), "15/06");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let result = TraceFormat::parse("cached {timestamp}");
        assert!(matches!(
            result,
            Err(CacheError::InvalidTraceFormat { ref reason, .. }) if reason.contains("{timestamp}")
        ));
    }

    #[test]
    fn test_unclosed_brace_rejected() {
        assert!(TraceFormat::parse("cached {time").is_err());
        assert!(TraceFormat::parse("cached {ti{me}").is_err());
    }

    #[test]
    fn test_unmatched_closing_brace_rejected() {
        assert!(TraceFormat::parse("cached time}").is_err());
    }

    #[test]
    fn test_bad_time_layout_rejected() {
        assert!(TraceFormat::parse("{time:}").is_err());
        assert!(TraceFormat::parse("{time:%Q}").is_err());
    }

    #[test]
    fn test_display_keeps_source() {
        let format = TraceFormat::parse("hit {time:%H}").unwrap();
        assert_eq!(format.to_string(), "hit {time:%H}");
        assert_eq!(format.as_str(), "hit {time:%H}");
    }
}
