//! Attribute renaming and formatting.
//!
//! # Responsibilities
//! - Map canonical attribute keys (level, time, source) to configured names
//! - Render timestamps with the configured strftime format
//! - Leave every other attribute untouched
//!
//! # Design Decisions
//! - Pure: no state beyond the options it borrows
//! - Invoked once per attribute per event by both output formats

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::config::schema::Options;

/// Canonical key of the severity attribute.
pub const LEVEL_KEY: &str = "level";

/// Canonical key of the time attribute.
pub const TIME_KEY: &str = "time";

/// Canonical key of the source location attribute.
pub const SOURCE_KEY: &str = "source";

/// Canonical key of the event message.
pub const MESSAGE_KEY: &str = "msg";

/// What an attribute represents, which decides how it is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Level,
    Time,
    Source,
    Other,
}

/// Attribute value before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Time(DateTime<Utc>),
    Json(Value),
}

impl AttrValue {
    fn into_json(self) -> Value {
        match self {
            AttrValue::Time(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            AttrValue::Json(v) => v,
        }
    }
}

/// A single key/value pair attached to a log event.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub kind: AttrKind,
    pub key: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn level(level: &tracing::Level) -> Self {
        Self {
            kind: AttrKind::Level,
            key: LEVEL_KEY.to_string(),
            value: AttrValue::Json(Value::String(level.to_string())),
        }
    }

    pub fn time(time: DateTime<Utc>) -> Self {
        Self {
            kind: AttrKind::Time,
            key: TIME_KEY.to_string(),
            value: AttrValue::Time(time),
        }
    }

    pub fn source(file: &str, line: Option<u32>) -> Self {
        let location = match line {
            Some(line) => format!("{file}:{line}"),
            None => file.to_string(),
        };
        Self {
            kind: AttrKind::Source,
            key: SOURCE_KEY.to_string(),
            value: AttrValue::Json(Value::String(location)),
        }
    }

    pub fn other(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: AttrKind::Other,
            key: key.into(),
            value: AttrValue::Json(value.into()),
        }
    }
}

/// Rewrites canonical attributes according to the configured field names and time format.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRewriter<'a> {
    options: &'a Options,
}

impl<'a> AttributeRewriter<'a> {
    /// `options` are expected to be resolved.
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Produce the output key and value for an attribute.
    pub fn rewrite(&self, attr: Attr) -> (String, Value) {
        match (attr.kind, attr.value) {
            (AttrKind::Level, value) => (self.options.level_field_name.clone(), value.into_json()),
            (AttrKind::Time, AttrValue::Time(time)) => (
                self.options.time_field_name.clone(),
                Value::String(self.format_time(time)),
            ),
            (AttrKind::Time, value) => (self.options.time_field_name.clone(), value.into_json()),
            (AttrKind::Source, value) if !self.options.source_field_name.is_empty() => {
                (self.options.source_field_name.clone(), value.into_json())
            }
            (_, value) => (attr.key, value.into_json()),
        }
    }

    fn format_time(&self, time: DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", time.format(&self.options.time_field_format)).is_err() {
            return time.to_rfc3339_opts(SecondsFormat::Nanos, true);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::nanoseconds(123_456_789)
    }

    #[test]
    fn test_level_key_renamed() {
        let opts = Options {
            level_field_name: "severity".to_string(),
            ..Options::default()
        }
        .resolve();
        let (key, value) = AttributeRewriter::new(&opts).rewrite(Attr::level(&tracing::Level::WARN));
        assert_eq!(key, "severity");
        assert_eq!(value, Value::String("WARN".to_string()));
    }

    #[test]
    fn test_level_key_default() {
        let opts = Options {
            level_field_name: String::new(),
            ..Options::default()
        }
        .resolve();
        let (key, _) = AttributeRewriter::new(&opts).rewrite(Attr::level(&tracing::Level::INFO));
        assert_eq!(key, "level");
    }

    #[test]
    fn test_time_default_format() {
        let opts = Options {
            time_field_format: String::new(),
            ..Options::default()
        }
        .resolve();
        let (key, value) = AttributeRewriter::new(&opts).rewrite(Attr::time(sample_time()));
        assert_eq!(key, "timestamp");
        assert_eq!(value, Value::String("2024-03-09T14:05:07.123456789Z".to_string()));
    }

    #[test]
    fn test_time_custom_format_and_name() {
        let opts = Options {
            time_field_name: "ts".to_string(),
            time_field_format: "%Y/%m/%d %H:%M".to_string(),
            ..Options::default()
        }
        .resolve();
        let (key, value) = AttributeRewriter::new(&opts).rewrite(Attr::time(sample_time()));
        assert_eq!(key, "ts");
        assert_eq!(value, Value::String("2024/03/09 14:05".to_string()));
    }

    #[test]
    fn test_source_renamed_when_enabled() {
        let opts = Options {
            source_field_name: "caller".to_string(),
            ..Options::default()
        }
        .resolve();
        let (key, value) = AttributeRewriter::new(&opts).rewrite(Attr::source("src/main.rs", Some(42)));
        assert_eq!(key, "caller");
        assert_eq!(value, Value::String("src/main.rs:42".to_string()));
    }

    #[test]
    fn test_other_attrs_pass_through() {
        let opts = Options {
            level_field_name: "severity".to_string(),
            ..Options::default()
        }
        .resolve();
        let rewriter = AttributeRewriter::new(&opts);

        let (key, value) = rewriter.rewrite(Attr::other("status", 200));
        assert_eq!(key, "status");
        assert_eq!(value, Value::from(200));

        // A field that merely shares the canonical name is not a level attribute.
        let (key, _) = rewriter.rewrite(Attr::other("level", "custom"));
        assert_eq!(key, "level");
    }
}
