// src/dispatcher.rs
//! Validates and debounces raw watcher events before anything downstream reacts to them.
//!
//! Editors usually produce several notifications per save (data write, metadata update, a
//! rename dance). The dispatcher keeps events for the active document only, collapses bursts
//! that fall inside [`DEBOUNCE_WINDOW`], and fires the callback once per settled change.

use crate::error::WatchError;
use crate::event::RawChangeEvent;
use crate::watcher::WatchMessage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, trace};

/// Minimum distance between the observation times of two accepted events.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Observation time of the last accepted event. Owned by the dispatch loop alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebounceState {
    last_accepted_at: Option<Instant>,
}

impl DebounceState {
    /// Accepts `observed_at` if it is at least [`DEBOUNCE_WINDOW`] after the last accepted
    /// observation, recording it. Nothing is recorded on rejection.
    ///
    /// The first observation is always accepted.
    pub fn accept(&mut self, observed_at: Instant) -> bool {
        if let Some(last) = self.last_accepted_at {
            let gap = observed_at.saturating_duration_since(last);
            if gap < DEBOUNCE_WINDOW {
                return false;
            }
        }
        self.last_accepted_at = Some(observed_at);
        true
    }

    pub fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }
}

/// Filters raw events through a validity predicate and the debounce window, invoking the
/// callback on its own task for each event that passes.
pub struct EventDispatcher<V, C> {
    validator: V,
    callback: Arc<C>,
    debounce: DebounceState,
}

impl<V, C> EventDispatcher<V, C>
where
    V: Fn(&str) -> bool,
    C: Fn() + Send + Sync + 'static,
{
    /// `validator` is consulted for every event, so it should read shared state rather than
    /// capture a snapshot of it.
    pub fn new(validator: V, callback: C) -> Self {
        Self {
            validator,
            callback: Arc::new(callback),
            debounce: DebounceState::default(),
        }
    }

    /// Decides a single event, returning `true` if the callback was scheduled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&mut self, event: &RawChangeEvent) -> bool {
        if !(self.validator)(event.path.as_str()) {
            trace!("Ignoring change for inactive path {}", event.path);
            return false;
        }
        if !self.debounce.accept(event.observed_at) {
            debug!("Debounced change for {}", event.path);
            return false;
        }

        debug!("Accepted change for {}", event.path);
        let callback = Arc::clone(&self.callback);
        tokio::spawn(async move { callback() });
        true
    }

    /// Consumes events in arrival order until the watcher fails or its channel closes.
    ///
    /// Only returns once watching has stopped for good: with the watcher's error, or
    /// [`WatchError::RelayClosed`] if the relay went away.
    pub async fn run(mut self, mut events: Receiver<WatchMessage>) -> WatchError {
        while let Some(message) = events.recv().await {
            match message {
                Ok(event) => {
                    self.dispatch(&event);
                }
                Err(e) => return WatchError::Notify(e),
            }
        }
        WatchError::RelayClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn first_observation_is_always_accepted() {
        let mut state = DebounceState::default();
        assert!(state.last_accepted_at().is_none());
        let now = Instant::now();
        assert!(state.accept(now));
        assert_eq!(state.last_accepted_at(), Some(now));
    }

    #[test]
    fn burst_inside_window_is_collapsed() {
        let base = Instant::now();
        let mut state = DebounceState::default();
        let accepted: Vec<bool> = [0, 10, 50, 99]
            .iter()
            .map(|ms| state.accept(at(base, *ms)))
            .collect();
        assert_eq!(accepted, vec![true, false, false, false]);
        assert_eq!(state.last_accepted_at(), Some(base));
    }

    #[test]
    fn window_is_measured_from_last_accepted_event() {
        let base = Instant::now();
        let mut state = DebounceState::default();
        assert!(state.accept(at(base, 0)));
        assert!(!state.accept(at(base, 60)));
        // 120ms after the accepted one, even though only 60ms after the rejected one.
        assert!(state.accept(at(base, 120)));
        assert!(!state.accept(at(base, 219)));
        assert!(state.accept(at(base, 220)));
    }

    #[test]
    fn older_observation_is_rejected() {
        let base = Instant::now();
        let mut state = DebounceState::default();
        assert!(state.accept(at(base, 500)));
        assert!(!state.accept(at(base, 0)));
    }
}
