//! Event formatters for the two output backends.
//!
//! Both formatters capture the event into an [`EventRecord`], pass every
//! attribute through the [`AttributeRewriter`] and then render it:
//! - [`JsonFormat`]: one JSON object per line, keys in emission order
//! - [`PrettyFormat`]: `time LEVEL message key=value ...`, colorized when
//!   the writer supports ANSI escapes

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::config::schema::Options;
use crate::observability::rewrite::{Attr, AttributeRewriter, MESSAGE_KEY, SOURCE_KEY};

/// Collects event fields into JSON values, pulling out the message.
#[derive(Debug, Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldCollector {
    fn record(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, Value::String(format!("{value:?}")));
    }
}

/// A captured event, before attribute rewriting.
#[derive(Debug)]
pub struct EventRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub source: Option<(String, Option<u32>)>,
    pub message: String,
    pub fields: Vec<(String, Value)>,
}

impl EventRecord {
    pub fn capture(options: &Options, event: &Event<'_>) -> Self {
        let metadata = event.metadata();
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let source = if options.add_source() {
            metadata.file().map(|file| (file.to_string(), metadata.line()))
        } else {
            None
        };

        Self {
            time: Utc::now(),
            level: *metadata.level(),
            source,
            message: collector.message.unwrap_or_default(),
            fields: collector.fields,
        }
    }

    /// Attributes that follow the message: tags first, then event fields.
    ///
    /// Canonical keys (time, level, source, message) take precedence; a tag
    /// or field using one of their output names is dropped.
    fn trailing_attrs(&self, options: &Options) -> Vec<Attr> {
        let source_key = if options.add_source() {
            options.source_field_name.as_str()
        } else {
            SOURCE_KEY
        };
        let reserved = [
            options.time_field_name.as_str(),
            options.level_field_name.as_str(),
            source_key,
            MESSAGE_KEY,
        ];

        options
            .tags
            .iter()
            .map(|(k, v)| Attr::other(k.clone(), v.clone()))
            .chain(self.fields.iter().map(|(k, v)| Attr::other(k.clone(), v.clone())))
            .filter(|attr| !reserved.contains(&attr.key.as_str()))
            .collect()
    }
}

/// Machine-parsable output: one JSON object per event.
#[derive(Debug, Clone)]
pub struct JsonFormat {
    options: Arc<Options>,
}

impl JsonFormat {
    pub fn new(options: Arc<Options>) -> Self {
        Self { options }
    }

    pub fn render(&self, record: &EventRecord) -> Value {
        let rewriter = AttributeRewriter::new(&self.options);
        let mut object = Map::new();

        let mut insert = |attr: Attr| {
            let (key, value) = rewriter.rewrite(attr);
            object.insert(key, value);
        };

        insert(Attr::time(record.time));
        insert(Attr::level(&record.level));
        if let Some((file, line)) = &record.source {
            insert(Attr::source(file, *line));
        }
        insert(Attr::other(MESSAGE_KEY, record.message.clone()));
        for attr in record.trailing_attrs(&self.options) {
            let (key, value) = rewriter.rewrite(attr);
            object.entry(key).or_insert(value);
        }

        Value::Object(object)
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = EventRecord::capture(&self.options, event);
        let line = serde_json::to_string(&self.render(&record)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Human-readable output for local development.
#[derive(Debug, Clone)]
pub struct PrettyFormat {
    options: Arc<Options>,
}

impl PrettyFormat {
    pub fn new(options: Arc<Options>) -> Self {
        Self { options }
    }

    pub fn render(&self, record: &EventRecord, ansi: bool) -> String {
        let rewriter = AttributeRewriter::new(&self.options);
        let (_, time) = rewriter.rewrite(Attr::time(record.time));
        let (_, level) = rewriter.rewrite(Attr::level(&record.level));
        let level_style: fn(&str) -> ColoredString = match record.level {
            Level::ERROR => |s: &str| s.red(),
            Level::WARN => |s: &str| s.yellow(),
            Level::INFO => |s: &str| s.green(),
            Level::DEBUG => |s: &str| s.blue(),
            _ => |s: &str| s.magenta(),
        };

        let mut line = format!(
            "{} {} {}",
            paint(ansi, plain(&time), |s: &str| s.dimmed()),
            paint(ansi, format!("{:<5}", plain(&level)), level_style),
            paint(ansi, record.message.clone(), |s: &str| s.bold()),
        );

        let mut attrs = Vec::new();
        if let Some((file, source_line)) = &record.source {
            attrs.push(Attr::source(file, *source_line));
        }
        attrs.extend(record.trailing_attrs(&self.options));

        for attr in attrs {
            let (key, value) = rewriter.rewrite(attr);
            line.push(' ');
            line.push_str(&paint(ansi, key, |s: &str| s.cyan()));
            line.push('=');
            line.push_str(&plain(&value));
        }

        line
    }
}

impl<S, N> FormatEvent<S, N> for PrettyFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = EventRecord::capture(&self.options, event);
        let ansi = writer.has_ansi_escapes();
        writeln!(writer, "{}", self.render(&record, ansi))
    }
}

fn paint(ansi: bool, text: String, style: fn(&str) -> ColoredString) -> String {
    if ansi {
        style(&text).to_string()
    } else {
        text
    }
}

/// Strings without quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
