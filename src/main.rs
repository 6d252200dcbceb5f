//! httplog demo server
//!
//! Serves a few endpoints behind the request logging middleware.
//!
//! ```text
//!   request ──▶ request id ──▶ request_logger ──▶ handler
//!                                   │
//!                                   ▼
//!                              HttpLogger ──▶ stdout (pretty) / stderr (JSON)
//!                                   ▲
//!   config file ──▶ ConfigWatcher ──┘ (configure on change)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use httplog::config::watcher::ConfigWatcher;
use httplog::config::{load_config, ServerConfig};
use httplog::{HttpLogger, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "httplog", version, about = "HTTP server with structured request logging")]
struct Args {
    /// Path to a TOML configuration file. Reloaded on change.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    let logger = HttpLogger::init(config.logging.clone())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        log_level = %config.logging.log_level,
        json = config.logging.json,
        "httplog v0.1.0 starting"
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path, &config);
            let watcher = watcher.run()?;
            let logger = logger.clone();
            tokio::spawn(async move {
                while let Some(options) = updates.recv().await {
                    logger.configure(options);
                    tracing::info!("Logging configuration reloaded");
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, logger);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
