//! menu-mailer status server.
//!
//! Provides an Axum-based HTTP server with:
//! - `GET /health`: liveness, no dependency checks
//! - `GET /status`: snapshot of today's send state
//! - `POST /send-now`: manual send through the scheduler

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use menumailer_core::scheduler::MenuScheduler;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub scheduler: Arc<MenuScheduler>,
}

/// The status server.
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server in front of `scheduler`.
    pub fn new(scheduler: Arc<MenuScheduler>) -> Self {
        Self {
            state: Arc::new(AppState { scheduler }),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(api::status::routes())
            .merge(api::trigger::routes())
            .fallback(api::status::not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server, listening on the given address.
    pub async fn start(self, listen_addr: &str) -> anyhow::Result<()> {
        let addr: SocketAddr = listen_addr.parse()?;
        let app = self.router();

        info!(addr = %addr, "starting status server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
