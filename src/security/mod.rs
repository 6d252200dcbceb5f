//! Security-related filtering of logged request data.
//!
//! # Design Decisions
//! - Redaction decisions are made before a header value reaches any formatter
//! - Configured names are normalized once, at configure time

pub mod headers;

pub use headers::{HeaderRedactor, REDACTED};
