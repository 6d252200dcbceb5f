//! Structured HTTP request logging.
//!
//! Maps logging options (level, field names, time format, JSON or pretty
//! output, per-route quiet-down, header redaction) onto a `tracing`
//! subscriber and provides the Axum middleware that emits one event per
//! request.

pub mod config;
pub mod http;
pub mod observability;
pub mod security;

pub use config::schema::{Options, ServerConfig};
pub use http::HttpServer;
pub use observability::HttpLogger;
