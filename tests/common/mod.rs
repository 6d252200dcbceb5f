//! Shared utilities for integration tests.

use std::io;
use std::sync::{Arc, Mutex};

use httplog::observability::logging::{backend_layer, level_filter};
use httplog::Options;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::Registry;

type Filtered = Layered<LevelFilter, Registry>;

/// In-memory writer collecting rendered log output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Rendered lines, in emission order.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).lines().map(str::to_string).collect()
    }

    /// Lines parsed as JSON objects.
    #[allow(dead_code)]
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a thread-local subscriber rendering with `options` into memory.
pub fn capture(options: &Options) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let options = Arc::new(options.clone().resolve());
    let subscriber = tracing_subscriber::registry()
        .with(level_filter(&options))
        .with(backend_layer::<Filtered, _>(options, logs.clone(), false));
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
