//! Pulse Monitor - endpoint health monitoring service.
//!
//! Polls registered HTTP(S) targets on their own intervals, keeps a rolling
//! history per target and serves status and uptime over a JSON API.

mod config;
mod db;
mod metrics;
mod monitor;
mod probe;
mod registry;
mod scheduler;
mod web;

use config::ServerConfig;
use db::Store;
use monitor::Monitor;
use probe::HttpProber;
use registry::Registry;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pulse_monitor=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Pulse Monitor on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    if cfg.overlap_guard {
        tracing::info!("Overlap guard enabled: busy targets skip ticks");
    }

    // Initialize storage and registry
    let store = Arc::new(Store::new(&cfg.db_path)?);
    let registry = Arc::new(Registry::load(store));

    // Start monitoring
    let prober = Arc::new(HttpProber::new(cfg.probe_timeout)?);
    let monitor = Arc::new(Monitor::new(registry, prober, cfg.overlap_guard));
    monitor.start().await;

    // Serve until Ctrl-C
    let server = Server::new(cfg, monitor.clone());
    server.start(shutdown_signal()).await?;

    monitor.shutdown().await;
    tracing::info!("Pulse Monitor stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
