use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use btc_dashboard::config;
use btc_dashboard::core::coordinator::Coordinator;
use btc_dashboard::logging;
use btc_dashboard::server::{self, AppState};
use btc_dashboard::sources::Sources;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("DASHBOARD_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        config_dir = %config_dir.display(),
        bind_addr = %config.app.server.bind_addr,
        refresh_secs = config.refresh.interval_seconds,
        "BTC dashboard starting"
    );

    // -----------------------------------------------------------------------
    // Component construction
    // -----------------------------------------------------------------------

    let sources = Arc::new(Sources::from_config(&config.sources)?);
    let (coordinator, snapshot_rx) = Coordinator::new(Arc::clone(&sources), &config.refresh);

    let app = server::router(
        AppState {
            sources,
            snapshot: snapshot_rx,
        },
        &config.app.server,
    );

    let shutdown = CancellationToken::new();

    // -----------------------------------------------------------------------
    // Launch concurrent tasks
    // -----------------------------------------------------------------------

    let coordinator_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.run(shutdown).await {
                error!(error = %e, "coordinator exited with error");
            }
        })
    };

    let server_handle = {
        let shutdown = shutdown.clone();
        let bind_addr = config.app.server.bind_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(app, &bind_addr, shutdown.clone()).await {
                error!(error = %e, "HTTP server exited with error");
                shutdown.cancel();
            }
        })
    };

    info!("all tasks running, press Ctrl+C to shutdown");

    // -----------------------------------------------------------------------
    // Wait for shutdown signal
    // -----------------------------------------------------------------------

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl+C")?;
            info!("shutdown signal received, stopping gracefully...");
        }
        () = shutdown.cancelled() => {
            info!("a task requested shutdown");
        }
    }
    shutdown.cancel();

    let (coordinator_res, server_res) = tokio::join!(coordinator_handle, server_handle);

    if let Err(e) = coordinator_res {
        error!(error = %e, "coordinator task panicked");
    }
    if let Err(e) = server_res {
        error!(error = %e, "HTTP server task panicked");
    }

    info!("shutdown complete");
    Ok(())
}
