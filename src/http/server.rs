//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with its handlers
//! - Wire up middleware (request ID, request logging)
//! - Bind to a listener and shut down gracefully on Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::schema::ServerConfig;
use crate::http::middleware::request_logger;
use crate::observability::logging::HttpLogger;

/// HTTP server with request logging.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and logger.
    pub fn new(config: ServerConfig, logger: Arc<HttpLogger>) -> Self {
        Self {
            router: Self::build_router(logger),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request-id layer is outermost so the logger sees the ID.
    pub fn build_router(logger: Arc<HttpLogger>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/status/{code}", get(status))
            .fallback(echo)
            .layer(middleware::from_fn_with_state(logger, request_logger))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Responds with the requested status code.
async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Echoes the method and path back to the client.
async fn echo(request: Request<Body>) -> String {
    format!("{} {}\n", request.method(), request.uri().path())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
