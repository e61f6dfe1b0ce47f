// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Etikett: barcode label print queue.
//
// Entry point. Initialises logging, loads configuration, starts the queue
// engine and serves the HTTP interface until Ctrl-C / SIGTERM.

use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};

use etikett_core::error::{EtikettError, Result};
use etikett_queue::{QueueEngine, output_from_config};
use etikett_server::{app, bootstrap};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Etikett starting");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Etikett stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let data_dir = bootstrap::data_dir()?;
    let config = bootstrap::load_config(&data_dir)?;
    let database_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| data_dir.join(bootstrap::DB_FILE));

    let output = output_from_config(&config.output);
    let mut engine = QueueEngine::open(&database_path, &config, output)?;
    engine.start();

    let listener = TcpListener::bind(&config.http_bind)
        .await
        .map_err(|e| EtikettError::Server(format!("bind {}: {e}", config.http_bind)))?;
    info!(addr = %listener.local_addr()?, db = %database_path.display(), "listening");

    let served = axum::serve(listener, app::router(engine.client()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| EtikettError::Server(format!("serve: {e}")));

    engine.shutdown().await;
    served?;
    info!("Etikett stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
