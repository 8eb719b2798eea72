//! Personal fasting tracker.
//!
//! The backend ([`api`], [`db`]) stores one live timer and a fast history per
//! user in SQLite and serves them over a small JSON API. The client side
//! ([`timer`], [`duration`]) drives a live timer against that API and turns
//! manual date/hour entries into fasts.

pub mod api;
pub mod config;
pub mod db;
pub mod duration;
pub mod timer;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::{net::TcpListener, signal};

use api::{build_router, AppState, RouterOptions};
use config::Config;
use db::Database;

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("fastlog starting up...");

    let config = Config::load()?;
    let database = Database::new(config.database_path())?;

    let options = RouterOptions {
        enable_cors: config.enable_cors,
        static_dir: config.static_dir.clone(),
    };
    if let Some(dir) = &options.static_dir {
        info!("Serving static files from {}", dir.display());
    }
    let app = build_router(Arc::new(AppState { db: database }), &options);

    let address = config.address()?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                error!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
