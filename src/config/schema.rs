//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so a minimal (or empty) file is valid.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

/// Default key for the severity attribute.
pub const DEFAULT_LEVEL_FIELD_NAME: &str = "level";

/// Default key for the time attribute.
pub const DEFAULT_TIME_FIELD_NAME: &str = "timestamp";

/// RFC 3339 with nanosecond precision. Timestamps are always rendered in UTC.
pub const DEFAULT_TIME_FIELD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Quiet-down period used when routes are configured without one.
pub const DEFAULT_QUIET_DOWN_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Root configuration for the server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Request logging options.
    pub logging: Options,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Minimum severity a logger emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name. Anything unrecognized means `Info`.
    pub fn parse(level: &str) -> Self {
        match level {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Request logging options.
///
/// Values are taken as given at deserialization time; [`Options::resolve`]
/// fills in defaults and is applied by [`HttpLogger`](crate::HttpLogger)
/// before the options are published.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Minimum severity: "debug", "info", "warn" or "error".
    pub log_level: String,

    /// Output key for the severity. Providers search for different names.
    pub level_field_name: String,

    /// JSON on stderr when true, colorized text on stdout otherwise.
    pub json: bool,

    /// Omit per-request details such as headers, user agent and content length.
    pub concise: bool,

    /// Static fields added at the root of every event (commit hash, environment, ...).
    pub tags: BTreeMap<String, String>,

    /// Headers whose values are redacted from request logs. Case-insensitive.
    pub skip_headers: Vec<String>,

    /// Routes that are logged once, then stay silent for `quiet_down_period`.
    pub quiet_down_routes: Vec<String>,

    /// Length of the quiet-down window, e.g. "30s" or "5m".
    #[serde(with = "humantime_serde")]
    pub quiet_down_period: Duration,

    /// strftime-style format of the time field.
    pub time_field_format: String,

    /// Output key for the time field.
    pub time_field_name: String,

    /// Output key for the source location. Empty disables source capture.
    pub source_field_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            level_field_name: DEFAULT_LEVEL_FIELD_NAME.to_string(),
            json: false,
            concise: false,
            tags: BTreeMap::new(),
            skip_headers: Vec::new(),
            quiet_down_routes: Vec::new(),
            quiet_down_period: Duration::ZERO,
            time_field_format: DEFAULT_TIME_FIELD_FORMAT.to_string(),
            time_field_name: DEFAULT_TIME_FIELD_NAME.to_string(),
            source_field_name: String::new(),
        }
    }
}

impl Options {
    /// Apply defaults for every empty or unusable field.
    pub fn resolve(mut self) -> Self {
        if self.level_field_name.is_empty() {
            self.level_field_name = DEFAULT_LEVEL_FIELD_NAME.to_string();
        }

        if self.time_field_format.is_empty() || !is_valid_time_format(&self.time_field_format) {
            self.time_field_format = DEFAULT_TIME_FIELD_FORMAT.to_string();
        }

        if self.time_field_name.is_empty() {
            self.time_field_name = DEFAULT_TIME_FIELD_NAME.to_string();
        }

        if !self.quiet_down_routes.is_empty() && self.quiet_down_period.is_zero() {
            self.quiet_down_period = DEFAULT_QUIET_DOWN_PERIOD;
        }

        for header in self.skip_headers.iter_mut() {
            header.make_ascii_lowercase();
        }

        self
    }

    /// Minimum severity derived from `log_level`.
    pub fn level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level)
    }

    /// Whether events carry their source location.
    pub fn add_source(&self) -> bool {
        !self.source_field_name.is_empty()
    }
}

fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
