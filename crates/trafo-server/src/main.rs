//! Trafo Server - Main entry point

use anyhow::Result;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use trafo_common::logging::{init_logging, LogConfig};

use trafo_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("trafo-server".to_string())
        .filter_directives("trafo_server=debug,tower_http=debug,sqlx=info".to_string())
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Trafo Server");

    let config = Config::load()?;
    info!(
        store = ?config.server.store,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = api::build_store(&config).await?;
    info!("Reading store initialized");

    let shutdown = shutdown_signal(config.server.shutdown_timeout_secs);
    api::serve(config, store, shutdown).await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
