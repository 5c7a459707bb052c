// src/preview.rs
//! Wires the watcher, dispatcher, broadcaster and HTTP server into a running live preview.

use crate::broadcast::UpdateBroadcaster;
use crate::dispatcher::EventDispatcher;
use crate::document::{relative_to_root, ActiveDocument};
use crate::watcher::{self, WatchMessage};
use crate::web::{self, AppState};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch::Receiver as WatchReceiver};
use tracing::{error, info};

const RAW_EVENT_CAPACITY: usize = 100;

/// Previews `document` from `root` on `listener` until shutdown or a watcher failure.
///
/// Changes to the active document are pushed to every `/es` client. The function returns
/// `Ok(())` after a clean shutdown.
///
/// # Errors
/// Returns an error if watching cannot start, the watcher fails later on, or the server fails.
pub async fn run_preview(
    root: &Path,
    document: &str,
    listener: TcpListener,
    shutdown_signal: WatchReceiver<bool>,
) -> Result<()> {
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve preview root {}", root.display()))?;
    let active = ActiveDocument::new(&relative_to_root(&root, document));
    info!("Previewing {} from {}", active.default_path(), root.display());

    let broadcaster = UpdateBroadcaster::new(shutdown_signal.clone());

    let (raw_tx, raw_rx) = mpsc::channel::<WatchMessage>(RAW_EVENT_CAPACITY);
    watcher::run_watcher(&root, raw_tx)?;

    let watched = active.clone();
    let notifier = broadcaster.clone();
    let dispatcher = EventDispatcher::new(
        move |path: &str| watched.is_active(path),
        move || {
            notifier.notify();
        },
    );

    let state = AppState {
        root,
        active,
        broadcaster,
    };
    let server = web::start_server(listener, state, shutdown_signal);

    tokio::select! {
        err = dispatcher.run(raw_rx) => {
            error!("Live preview cannot continue: {}", err);
            Err(err.into())
        }
        result = server => result,
    }
}
