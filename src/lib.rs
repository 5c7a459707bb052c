// src/lib.rs

#![doc = r#"
# Marklive

Marklive converts markdown files to standalone HTML pages, or serves a single file as a live
preview that refreshes in the browser whenever the file changes on disk.

## Modules

- [`config`]: Configuration loading and merging from CLI, file, and environment.
- [`event`]: Raw filesystem change events and path normalization.
- [`watcher`]: File system watcher relaying OS notifications.
- [`dispatcher`]: Validation and debouncing of raw change events.
- [`broadcast`]: Fan-out of settled changes to Server-Sent Events connections.
- [`document`]: The active document shared by the server and the dispatcher.
- [`render`]: Markdown to HTML rendering.
- [`assets`]: Page chrome (head, stylesheet, scripts).
- [`web`]: Preview HTTP server.
- [`preview`]: Wiring of watcher, dispatcher and server.
- [`convert`]: Batch conversion to sibling HTML files.
- [`error`]: Error types.
"#]

pub mod assets;
pub mod broadcast;
pub mod config;
pub mod convert;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod event;
pub mod preview;
pub mod render;
pub mod watcher;
pub mod web;
