// src/watcher.rs
use crate::error::WatchError;
use crate::event::{normalize_path_separators, RawChangeEvent};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info};

/// What the relay thread hands to the dispatcher: a change, or the error that ends watching.
pub type WatchMessage = Result<RawChangeEvent, notify::Error>;

/// Starts watching `root` recursively and relays every notification into `event_tx`.
///
/// The OS watcher is created and subscribed before this function returns, so an unusable
/// environment is reported to the caller right away. Afterwards a dedicated thread owns the
/// watcher for the rest of the process lifetime and forwards each notification, stamped with
/// the time it was received, as a [`RawChangeEvent`] whose path is relative to `root`.
///
/// Errors reported by the OS facility are forwarded as `Err` messages; the relay stops after
/// the first one.
///
/// # Errors
///
/// Returns an error if `root` cannot be resolved, the watcher cannot be created, or the
/// subscription for `root` fails.
pub fn run_watcher(root: &Path, event_tx: Sender<WatchMessage>) -> Result<(), WatchError> {
    let root = root.canonicalize().map_err(|source| WatchError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let (notify_tx, notify_rx) = std::sync::mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(notify_tx).map_err(WatchError::Init)?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|source| WatchError::Subscribe {
            path: root.clone(),
            source,
        })?;
    info!("[WatcherThread] Watching folder: {}", root.display());

    std::thread::Builder::new()
        .name("marklive-watcher".into())
        .spawn(move || {
            // Dropping the watcher would end the subscription.
            let _watcher = watcher;
            relay(&root, notify_rx, &event_tx);
            info!("[WatcherThread] Exiting.");
        })
        .map_err(|e| WatchError::Init(notify::Error::io(e)))?;

    Ok(())
}

fn relay(
    root: &Path,
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    event_tx: &Sender<WatchMessage>,
) {
    for result in notify_rx {
        let observed_at = Instant::now();
        match result {
            Ok(event) => {
                for path in &event.paths {
                    let change = RawChangeEvent {
                        path: relative_event_path(root, path),
                        observed_at,
                    };
                    debug!("[WatcherThread] {:?} -> {}", event.kind, change.path);
                    if event_tx.blocking_send(Ok(change)).is_err() {
                        debug!("[WatcherThread] Dispatcher gone, stopping relay.");
                        return;
                    }
                }
            }
            Err(e) => {
                error!("[WatcherThread] Watcher reported error: {}", e);
                let _ = event_tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

/// Expresses an OS-reported `path` relative to the watched `root`, with `/` separators.
///
/// Paths outside `root` are kept as reported.
pub fn relative_event_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    normalize_path_separators(&relative.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_paths_are_made_relative_to_root() {
        let root = Path::new("/home/me/docs");
        assert_eq!(
            relative_event_path(root, Path::new("/home/me/docs/notes.md")),
            "notes.md"
        );
        assert_eq!(
            relative_event_path(root, Path::new("/home/me/docs/sub/a.md")),
            "sub/a.md"
        );
    }

    #[test]
    fn paths_outside_root_are_kept() {
        let root = Path::new("/home/me/docs");
        assert_eq!(
            relative_event_path(root, Path::new("/tmp/other.md")),
            "/tmp/other.md"
        );
    }
}
