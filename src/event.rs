// src/event.rs
use std::time::Instant;

/// A single filesystem change as observed by the watcher.
///
/// # Fields
/// - `path`: The changed path, relative to the watched root, with `/` separators.
/// - `observed_at`: When the watcher received the notification from the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChangeEvent {
    /// The changed path, relative to the watched root, with `/` separators.
    pub path: String,
    /// When the watcher received the notification from the OS.
    pub observed_at: Instant,
}

impl RawChangeEvent {
    /// Builds an event for `path`, normalizing its separators.
    pub fn new(path: &str, observed_at: Instant) -> Self {
        Self {
            path: normalize_path_separators(path),
            observed_at,
        }
    }
}

/// Rewrites every `\` in `path` to `/`. Nothing else is touched.
pub fn normalize_path_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_path_separators(r"docs\notes.md"), "docs/notes.md");
        assert_eq!(normalize_path_separators(r"a\b\c"), "a/b/c");
    }

    #[test]
    fn forward_slash_paths_are_unchanged() {
        assert_eq!(normalize_path_separators("./docs/notes.md"), "./docs/notes.md");
        assert_eq!(normalize_path_separators(""), "");
    }

    #[test]
    fn new_event_normalizes_path() {
        let now = Instant::now();
        let event = RawChangeEvent::new(r"sub\readme.md", now);
        assert_eq!(event.path, "sub/readme.md");
        assert_eq!(event.observed_at, now);
    }
}
