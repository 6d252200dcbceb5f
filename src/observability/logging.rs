//! Structured logging.
//!
//! # Responsibilities
//! - Resolve logging options and publish them atomically
//! - Own the quiet-down table and header redaction set
//! - Install the process-wide subscriber and swap its backend on reconfigure
//!
//! # Design Decisions
//! - Uses tracing for emission, tracing-subscriber for filtering and output
//! - JSON on stderr for production, colorized text on stdout for development
//! - The subscriber is installed once; `configure` reloads the level filter
//!   and the formatting layer through reload handles
//! - A configuration is one `Arc<LogState>` so readers never see a mix of
//!   old and new options

use std::io::IsTerminal;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwap;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Layer, Registry};

use crate::config::schema::Options;
use crate::observability::format::{JsonFormat, PrettyFormat};
use crate::observability::quiet_down::QuietDownTracker;
use crate::security::headers::HeaderRedactor;

type FilteredRegistry = Layered<reload::Layer<LevelFilter, Registry>, Registry>;

/// Output layer installed on top of the level filter.
pub type BackendLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("logger already installed")]
    AlreadyInstalled,

    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// One published configuration.
#[derive(Debug)]
pub struct LogState {
    options: Arc<Options>,
    quiet_down: QuietDownTracker,
    redactor: HeaderRedactor,
}

impl LogState {
    fn new(options: Options) -> Self {
        Self::with_tracker(options, &QuietDownTracker::default())
    }

    /// Build a state whose quiet-down tracker shares `previous`'s entries.
    fn with_tracker(options: Options, previous: &QuietDownTracker) -> Self {
        let options = options.resolve();
        let quiet_down =
            previous.reconfigured(options.quiet_down_routes.iter().cloned(), options.quiet_down_period);
        let redactor = HeaderRedactor::new(&options.skip_headers);

        Self {
            options: Arc::new(options),
            quiet_down,
            redactor,
        }
    }

    /// Resolved options.
    pub fn options(&self) -> &Arc<Options> {
        &self.options
    }

    pub fn should_log(&self, route: &str, now: Instant) -> bool {
        self.quiet_down.should_log(route, now)
    }

    pub fn is_redacted(&self, header: &str) -> bool {
        self.redactor.is_redacted(header)
    }
}

struct ReloadHandles {
    level: reload::Handle<LevelFilter, Registry>,
    backend: reload::Handle<BackendLayer, FilteredRegistry>,
}

/// Request logging context: options, quiet-down state and the installed backend.
///
/// One instance is owned per server and shared via `Arc`. Tests can build
/// any number of independent instances with [`HttpLogger::new`]; only
/// [`HttpLogger::install`] touches process-wide state.
pub struct HttpLogger {
    state: ArcSwap<LogState>,
    handles: OnceLock<ReloadHandles>,
}

impl HttpLogger {
    /// Build a logger context without installing it.
    pub fn new(options: Options) -> Self {
        Self {
            state: ArcSwap::from_pointee(LogState::new(options)),
            handles: OnceLock::new(),
        }
    }

    /// Build a logger context and install it as the global subscriber.
    pub fn init(options: Options) -> Result<Arc<Self>, LoggingError> {
        let logger = Arc::new(Self::new(options));
        logger.install()?;
        Ok(logger)
    }

    /// Install the global subscriber using the current options.
    pub fn install(&self) -> Result<(), LoggingError> {
        if self.handles.get().is_some() {
            return Err(LoggingError::AlreadyInstalled);
        }

        let options = Arc::clone(self.state.load().options());
        let (level, level_handle) = reload::Layer::new(level_filter(&options));
        let (backend, backend_handle) = reload::Layer::new(stdio_backend(options));

        tracing_subscriber::registry().with(level).with(backend).try_init()?;

        let _ = self.handles.set(ReloadHandles {
            level: level_handle,
            backend: backend_handle,
        });
        Ok(())
    }

    /// Replace the current configuration. Never fails; unusable values fall back to defaults.
    ///
    /// Quiet-down entries survive: a route already seen keeps its first-seen time.
    pub fn configure(&self, options: Options) {
        let state = Arc::new(LogState::with_tracker(options, &self.state.load().quiet_down));
        let options = Arc::clone(state.options());
        self.state.store(state);

        if let Some(handles) = self.handles.get() {
            if let Err(e) = handles.level.reload(level_filter(&options)) {
                tracing::warn!(error = %e, "Failed to reload log level");
            }
            if let Err(e) = handles.backend.reload(stdio_backend(Arc::clone(&options))) {
                tracing::warn!(error = %e, "Failed to reload log backend");
            }
        }

        tracing::debug!(
            level = %options.log_level,
            json = options.json,
            quiet_down_routes = options.quiet_down_routes.len(),
            "Logging configured"
        );
    }

    /// Snapshot of the current configuration. Use one snapshot per request.
    pub fn state(&self) -> Arc<LogState> {
        self.state.load_full()
    }

    /// Resolved options currently in effect.
    pub fn options(&self) -> Arc<Options> {
        Arc::clone(self.state.load().options())
    }

    pub fn should_log(&self, route: &str, now: Instant) -> bool {
        self.state.load().should_log(route, now)
    }

    pub fn is_redacted(&self, header: &str) -> bool {
        self.state.load().is_redacted(header)
    }
}

/// Minimum severity filter for resolved options.
pub fn level_filter(options: &Options) -> LevelFilter {
    LevelFilter::from_level(options.level().into())
}

/// Formatting layer for `options`, writing to `writer`.
pub fn backend_layer<S, W>(options: Arc<Options>, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if options.json {
        fmt::layer()
            .event_format(JsonFormat::new(options))
            .with_writer(writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .event_format(PrettyFormat::new(options))
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed()
    }
}

fn stdio_backend(options: Arc<Options>) -> BackendLayer {
    if options.json {
        backend_layer(options, std::io::stderr, false)
    } else {
        backend_layer(options, std::io::stdout, std::io::stdout().is_terminal())
    }
}
