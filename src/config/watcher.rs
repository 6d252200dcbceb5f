//! Hot reload of logging options.
//!
//! # Responsibilities
//! - Watch the config file and re-parse it on change
//! - Forward the `[logging]` section when it differs from the last one sent
//!
//! # Design Decisions
//! - Editors fire several events per save; identical options are dropped so
//!   a re-save never re-applies the same configuration
//! - The listener section is read once at startup; changes to it are logged
//!   and otherwise ignored
//! - A file that fails to load keeps the current configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{ListenerConfig, Options, ServerConfig};

/// Watches the configuration file and publishes changed logging options.
pub struct ConfigWatcher {
    path: PathBuf,
    listener: ListenerConfig,
    last_sent: Options,
    update_tx: mpsc::UnboundedSender<Options>,
}

impl ConfigWatcher {
    /// `current` is the configuration the server started with.
    ///
    /// Returns the watcher and a receiver of logging option updates.
    pub fn new(path: &Path, current: &ServerConfig) -> (Self, mpsc::UnboundedReceiver<Options>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            path: path.to_path_buf(),
            listener: current.listener.clone(),
            last_sent: current.logging.clone(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Forward the logging options of `config` unless they are unchanged.
    ///
    /// Returns true if an update was sent.
    pub fn publish(&mut self, config: ServerConfig) -> bool {
        if config.listener.bind_address != self.listener.bind_address {
            tracing::warn!(
                bind_address = %config.listener.bind_address,
                "Listener changes require a restart, ignoring"
            );
            self.listener = config.listener;
        }

        if config.logging == self.last_sent {
            tracing::debug!(path = ?self.path, "Logging options unchanged");
            return false;
        }

        self.last_sent = config.logging.clone();
        self.update_tx.send(config.logging).is_ok()
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&self.path) {
                        Ok(config) => {
                            if self.publish(config) {
                                tracing::info!(path = ?self.path, "Logging options changed");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
