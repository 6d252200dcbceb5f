//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → ServerConfig { listener, logging: Options }
//!     → HttpLogger::configure (defaults applied, atomically published)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → HttpLogger::configure replaces the logging options
//! ```
//!
//! # Design Decisions
//! - Every field has a default so minimal configs work
//! - Logging options never fail validation; bad values degrade to defaults
//! - Reconfiguration is last-writer-wins, nothing is merged

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, LogLevel, Options, ServerConfig};
