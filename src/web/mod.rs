//! JSON API over the monitor's read and command surface.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::monitor::Monitor;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
}

/// API server for Pulse Monitor.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, monitor: Arc<Monitor>) -> Self {
        Self {
            config,
            state: AppState { monitor },
        }
    }

    /// Build the router with all routes.
    pub fn routes(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.routes();

        tracing::info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/api/summary", get(handlers::handle_summary))
        .route("/api/targets", get(handlers::handle_list_targets))
        .route("/api/targets", post(handlers::handle_create_target))
        .route("/api/targets/{id}", get(handlers::handle_get_target))
        .route("/api/targets/{id}", delete(handlers::handle_delete_target))
        .route("/api/targets/{id}/active", put(handlers::handle_set_active))
        .route("/api/targets/{id}/toggle", post(handlers::handle_toggle_target))
        .route("/api/targets/{id}/interval", put(handlers::handle_set_interval))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}
