// src/broadcast.rs
//! Fan-out of settled document changes to every open event-stream connection.
//!
//! Each `/es` client owns a [`Connection`] subscribed to a shared `tokio::sync::broadcast`
//! channel, so every connection sees every change. A connection writes one Server-Sent Events
//! record per trigger: an `update` record for a real change, or a bare keep-alive record after
//! [`KEEP_ALIVE_INTERVAL`] of silence.

use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch::Receiver as WatchReceiver,
};
use tracing::{debug, info};

/// Idle time after which a connection sends a keep-alive record.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Keep-alive record. It carries no event name, so clients listening for `update` ignore it.
pub const KEEP_ALIVE_RECORD: &str = "data: \n\n";

const CHANNEL_CAPACITY: usize = 16;

/// Formats the record pushed to a client when the active document changed.
pub fn format_update_record(id: u64, data: u64) -> String {
    format!("id: {id}\nevent: update\ndata: {data}\n\n")
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The current unix time in milliseconds, bumped past `last` if the clock has not moved on.
fn stamp_after(last: u64) -> u64 {
    unix_millis().max(last.saturating_add(1))
}

/// Hands out change notifications to connected clients.
///
/// Cheap to clone; all clones feed the same set of connections.
#[derive(Clone)]
pub struct UpdateBroadcaster {
    tx: broadcast::Sender<()>,
    last_connection_id: Arc<AtomicU64>,
    keep_alive: Duration,
    shutdown: WatchReceiver<bool>,
}

impl UpdateBroadcaster {
    /// Creates a broadcaster whose connections end once `shutdown` flips to `true`.
    pub fn new(shutdown: WatchReceiver<bool>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            last_connection_id: Arc::new(AtomicU64::new(0)),
            keep_alive: KEEP_ALIVE_INTERVAL,
            shutdown,
        }
    }

    /// Overrides the keep-alive cadence for connections opened afterwards.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Signals a settled change to every open connection. Returns how many were reached.
    pub fn notify(&self) -> usize {
        match self.tx.send(()) {
            Ok(count) => {
                debug!("Change broadcast to {} event-source connection(s)", count);
                count
            }
            Err(_) => {
                debug!("No event-source connections, change not broadcast");
                0
            }
        }
    }

    /// Number of connections currently subscribed.
    pub fn connection_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Opens a new connection with a fresh id.
    pub fn connect(&self) -> Connection {
        let mut last = self.last_connection_id.load(Ordering::SeqCst);
        let id = loop {
            let next = stamp_after(last);
            match self.last_connection_id.compare_exchange_weak(
                last,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break next,
                Err(current) => last = current,
            }
        };
        info!("[event-source:{}] connected", id);
        Connection {
            id,
            updates: self.tx.subscribe(),
            keep_alive: self.keep_alive,
            shutdown: self.shutdown.clone(),
            last_data: 0,
        }
    }
}

/// One client's subscription, turned into SSE records on demand.
///
/// Dropping it (client gone, response body dropped) unsubscribes.
pub struct Connection {
    id: u64,
    updates: broadcast::Receiver<()>,
    keep_alive: Duration,
    shutdown: WatchReceiver<bool>,
    last_data: u64,
}

impl Connection {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next change, keep-alive tick, or shutdown, whichever comes first.
    ///
    /// Returns the record to write, or `None` once the connection should close.
    pub async fn next_record(&mut self) -> Option<String> {
        if *self.shutdown.borrow() {
            return None;
        }
        let record = tokio::select! {
            result = self.updates.recv() => match result {
                // Missed triggers collapse into one update; the client refetches anyway.
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    self.last_data = stamp_after(self.last_data);
                    format_update_record(self.id, self.last_data)
                }
                Err(RecvError::Closed) => return None,
            },
            _ = tokio::time::sleep(self.keep_alive) => KEEP_ALIVE_RECORD.to_string(),
            _ = self.shutdown.changed() => return None,
        };
        debug!("[event-source:{}] sent event: {:?}", self.id, record);
        Some(record)
    }

    /// Turns the connection into a body stream for the HTTP response.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, Infallible>> + Send {
        stream::unfold(self, |mut conn| async move {
            let record = conn.next_record().await?;
            Some((Ok(record), conn))
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        info!("[event-source:{}] exited", self.id);
    }
}
