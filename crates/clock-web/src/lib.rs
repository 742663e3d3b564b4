//! HTTP surface for the analog clock.
//!
//! This crate provides:
//! - Snapshot query endpoint polled by renderers (`/clock_data.json`)
//! - Command endpoints that validate requests and queue them in the mailbox
//! - WebSocket endpoint streaming every published snapshot
//! - Optional static file serving for the renderer
//! - Prometheus metrics
//!
//! # Usage
//!
//! ```ignore
//! use clock_web::{WebConfig, WebServer};
//!
//! let server = WebServer::new(config, Arc::clone(&mailbox));
//!
//! // Hand this to the tick loop
//! let updater = server.state_updater();
//!
//! // Serve until cancelled
//! server.start().await?;
//! ```

mod api;
mod metrics;
mod state;
mod websocket;

pub use api::*;
pub use metrics::*;
pub use state::*;
pub use websocket::*;

pub use clock_common::config::WebConfig;

use axum::{
    routing::{get, post, Router},
    Extension,
};
use clock_common::mailbox::CommandMailbox;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

/// Web server exposing the published clock state.
pub struct WebServer {
    config: WebConfig,
    state: Arc<SharedState>,
    broadcast_tx: broadcast::Sender<StateUpdate>,
    metrics: Arc<ClockMetrics>,
    mailbox: Arc<CommandMailbox>,
}

impl WebServer {
    /// Create a new web server that queues commands into `mailbox`.
    pub fn new(config: WebConfig, mailbox: Arc<CommandMailbox>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.ws_channel_capacity.max(1));
        Self {
            config,
            state: Arc::new(SharedState::default()),
            broadcast_tx,
            metrics: Arc::new(ClockMetrics::new()),
            mailbox,
        }
    }

    /// Get a handle for publishing snapshots from the tick loop.
    pub fn state_updater(&self) -> StateUpdater {
        StateUpdater {
            state: Arc::clone(&self.state),
            broadcast_tx: self.broadcast_tx.clone(),
            metrics: Some(Arc::clone(&self.metrics)),
        }
    }

    /// Get a reference to the Prometheus metrics.
    pub fn metrics(&self) -> Arc<ClockMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Start the web server.
    ///
    /// This is an async function that runs until cancelled.
    pub async fn start(self) -> anyhow::Result<()> {
        let bind_addr = self.config.bind_addr;
        info!(addr = %bind_addr, "Starting web server");

        let app = self.router();

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        info!(addr = %bind_addr, "Web server listening");

        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let sink = CommandSink {
            mailbox: Arc::clone(&self.mailbox),
            broadcast_tx: self.broadcast_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        };

        let mut app = Router::new()
            // Health check
            .route("/health", get(api::health_check))
            // Snapshot query
            .route("/clock_data.json", get(api::get_snapshot))
            .route("/api/state", get(api::get_snapshot))
            // Commands
            .route("/set_alarm", post(api::set_alarm))
            .route("/set_time", post(api::set_time))
            .route("/sync_time", post(api::sync_time))
            .route("/clear_alarm", post(api::clear_alarm))
            // Prometheus metrics endpoint
            .route("/metrics", get(metrics::metrics_handler))
            // WebSocket endpoint
            .route("/ws", get(websocket::ws_handler));

        // Renderer assets for every other path, when configured
        app = match &self.config.static_dir {
            Some(dir) => {
                info!(path = %dir.display(), "Serving static files");
                app.fallback_service(ServeDir::new(dir))
            }
            None => app.fallback(api::not_found),
        };

        app = app
            // Extensions
            .layer(Extension(Arc::clone(&self.state)))
            .layer(Extension(sink))
            .layer(Extension(Arc::clone(&self.metrics)));

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }
}
