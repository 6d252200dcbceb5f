//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID)
//!     → middleware.rs (timing, quiet-down, redaction, one event per request)
//!     → handler
//!     → response to client
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{request_logger, X_REQUEST_ID};
pub use server::HttpServer;
