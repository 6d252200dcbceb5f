//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request completes
//!     → quiet_down.rs (suppress repeated events for noisy routes)
//!     → tracing event emitted by the middleware
//!     → logging.rs (level filter, backend selected by options)
//!     → format.rs (capture fields, JSON or pretty rendering)
//!     → rewrite.rs (rename level/time/source, format time)
//!     → stderr (JSON) or stdout (pretty)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Field names and time format configurable per log provider
//! - Reconfiguration is an atomic swap of the whole logging state

pub mod format;
pub mod logging;
pub mod quiet_down;
pub mod rewrite;

pub use logging::{HttpLogger, LogState, LoggingError};
pub use quiet_down::QuietDownTracker;
pub use rewrite::{Attr, AttrKind, AttrValue, AttributeRewriter};
