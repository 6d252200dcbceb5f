//! Request logging middleware.
//!
//! # Responsibilities
//! - Time each request and capture method, path, status and request ID
//! - Ask the quiet-down tracker whether the request is logged
//! - Redact sensitive headers before they reach the log line
//! - Pick the event level from the response status
//!
//! # Design Decisions
//! - One event per request, emitted after the response is produced
//! - The logging state is read once per request, so a concurrent
//!   reconfiguration never mixes old and new options in one event
//! - Concise mode drops headers, user agent, content length, proto and peer

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};
use tracing::Level;

use crate::observability::logging::{HttpLogger, LogState};
use crate::security::headers::REDACTED;

/// Request ID header, set by the request-id layer in front of this middleware.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers whose values are never logged, whatever the configuration says.
const ALWAYS_REDACTED: [&str; 3] = ["authorization", "cookie", "set-cookie"];

macro_rules! event_at {
    ($level:expr, $($args:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($args)+),
            Level::WARN => tracing::warn!($($args)+),
            _ => tracing::info!($($args)+),
        }
    };
}

/// Per-request details omitted in concise mode.
struct RequestDetails {
    remote_ip: Option<String>,
    proto: String,
    user_agent: Option<String>,
    content_length: Option<u64>,
    headers: Value,
}

impl RequestDetails {
    fn capture(request: &Request<Body>, state: &LogState) -> Self {
        let headers = request.headers();
        Self {
            remote_ip: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
            proto: format!("{:?}", request.version()),
            user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_string),
            content_length: header_str(headers, header::CONTENT_LENGTH.as_str()).and_then(|v| v.parse().ok()),
            headers: header_fields(headers, state),
        }
    }
}

/// Middleware function logging one event per completed request.
pub async fn request_logger(
    State(logger): State<Arc<HttpLogger>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let state = logger.state();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = header_str(request.headers(), X_REQUEST_ID)
        .unwrap_or("unknown")
        .to_string();
    let details = if state.options().concise {
        None
    } else {
        Some(RequestDetails::capture(&request, &state))
    };

    let response = next.run(request).await;

    let now = Instant::now();
    if !state.should_log(&path, now) {
        return response;
    }

    let status = response.status();
    let elapsed_ms = now.duration_since(start).as_secs_f64() * 1000.0;
    let level = status_level(status);

    match details {
        Some(details) => event_at!(
            level,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            request_id = %request_id,
            remote_ip = details.remote_ip.as_deref(),
            proto = %details.proto,
            user_agent = details.user_agent.as_deref(),
            content_length = details.content_length,
            request_headers = %details.headers,
            "{} {} => {}", method, path, status.as_u16()
        ),
        None => event_at!(
            level,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            request_id = %request_id,
            "{} {} => {}", method, path, status.as_u16()
        ),
    }

    response
}

/// 5xx is an error, 4xx a warning, everything else informational.
pub fn status_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Render request headers as a JSON object with sensitive values replaced.
pub fn header_fields(headers: &HeaderMap, state: &LogState) -> Value {
    let mut fields = Map::new();

    for name in headers.keys() {
        let key = name.as_str();
        let value = if ALWAYS_REDACTED.contains(&key) || state.is_redacted(key) {
            REDACTED.to_string()
        } else {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str().unwrap_or("<binary>"))
                .collect();
            match values.as_slice() {
                [single] => single.to_string(),
                many => format!("[{}]", many.join("], [")),
            }
        };
        fields.insert(key.to_string(), Value::String(value));
    }

    Value::Object(fields)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
