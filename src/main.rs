// src/main.rs

//! # Marklive Main Entry Point
//!
//! Loads configuration and logging, then either converts the given files to HTML or runs the
//! live preview server for a single file.

use anyhow::Result;
use std::path::Path;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use marklive::config::AppConfig;
use marklive::{convert, preview, web};

/// The main entry point for the Marklive application.
///
/// 1. Loads the application configuration from CLI, file, and environment.
/// 2. Initializes the tracing subscriber for logging.
/// 3. In batch mode, converts every path and exits non-zero on the first failure.
/// 4. In preview mode, binds the server, starts watching, and runs until Ctrl-C or a fatal
///    watcher error.
#[tokio::main]
async fn main() -> Result<()> {
    let app_config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing subscriber for logging with environment filter and max level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&app_config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_max_level(tracing::Level::TRACE)
        .with_writer(std::io::stderr) // Log to stderr
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Setting default tracing subscriber failed");

    tracing::debug!("Marklive starting with configuration: {:?}", app_config);

    if !app_config.preview {
        if let Err(e) = convert::convert_all(&app_config.paths) {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let (host, port) = app_config.listen_addr();
    let listener = match web::bind(&host, port).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Shutdown signal channel for the server and open event streams.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let document = app_config.paths[0].clone();
    let mut preview_task = tokio::spawn(async move {
        preview::run_preview(Path::new("."), &document, listener, shutdown_rx).await
    });

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("Ctrl-C received, initiating shutdown..."),
                Err(err) => tracing::error!("Failed to listen for Ctrl-C signal: {}", err),
            }
            None
        }
        result = &mut preview_task => Some(result),
    };

    let result = match finished {
        Some(result) => result,
        None => {
            if shutdown_tx.send(true).is_err() {
                tracing::error!("Failed to send shutdown signal");
            }
            preview_task.await
        }
    };

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Preview task panicked or was cancelled: {}", e);
            std::process::exit(1);
        }
    }

    tracing::info!("Marklive shut down gracefully.");
    Ok(())
}
