//! Header redaction for request logs.
//!
//! # Responsibilities
//! - Hold the configured set of sensitive header names
//! - Answer case-insensitive "is this header redacted?" queries
//!
//! # Design Decisions
//! - Names are lower-cased once at construction; lookups lower-case the query
//! - Header names are ASCII per RFC 9110, so ASCII case folding is sufficient

use std::collections::HashSet;

/// Placeholder logged in place of a redacted header value.
pub const REDACTED: &str = "***";

/// Case-insensitive membership test over configured header names.
#[derive(Debug, Clone, Default)]
pub struct HeaderRedactor {
    headers: HashSet<String>,
}

impl HeaderRedactor {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|h| h.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Returns true if the value of `name` must not be logged.
    pub fn is_redacted(&self, name: &str) -> bool {
        if self.headers.is_empty() {
            return false;
        }
        self.headers.contains(&name.to_ascii_lowercase())
    }
}
