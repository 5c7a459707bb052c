// src/web.rs
use crate::assets::wrap_page;
use crate::broadcast::UpdateBroadcaster;
use crate::document::{is_document_path, ActiveDocument};
use crate::error::PreviewError;
use crate::render::render_markdown;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::net::TcpListener;
use tokio::sync::watch::Receiver as WatchReceiver;
use tracing::info;

/// Shared state for the preview handlers.
#[derive(Clone)]
pub struct AppState {
    /// Directory request paths are resolved against.
    pub root: PathBuf,
    /// The document being previewed; also read by the change dispatcher.
    pub active: ActiveDocument,
    /// Feeds the `/es` connections.
    pub broadcaster: UpdateBroadcaster,
}

/// Content type for a static passthrough file, from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "text/xml; charset=utf-8",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Percent-decodes a URL path. Undecodable input is kept as sent.
pub fn decode_request_path(raw: &str) -> String {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

/// Turns a decoded URL path into a relative filesystem path, or `None` if it tries to leave
/// the served directory or names nothing.
pub fn resolve_request_path(decoded: &str) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

fn read_error(path: &str, source: io::Error) -> PreviewError {
    if source.kind() == io::ErrorKind::NotFound {
        PreviewError::NotFound(format!("/{}", path))
    } else {
        PreviewError::Read {
            path: path.to_string(),
            source,
        }
    }
}

/// Renders `doc` (relative to the state root) to an HTML fragment.
async fn render_document(state: &AppState, doc: &str) -> Result<String, PreviewError> {
    let bytes = tokio::fs::read(state.root.join(doc))
        .await
        .map_err(|e| read_error(doc, e))?;
    Ok(render_markdown(&String::from_utf8_lossy(&bytes)))
}

async fn preview_page(state: &AppState, doc: &str) -> Result<Response, PreviewError> {
    let body = render_document(state, doc).await?;
    Ok(Html(wrap_page(doc, &body, true)).into_response())
}

/// Handles `/` and every path without a dedicated route.
///
/// `/` brings back the startup document. Any other existing document becomes the active one;
/// other existing files are served as they are.
async fn serve_path(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, PreviewError> {
    info!("-> {} {}", method, uri.path());

    if uri.path() == "/" {
        let doc = state.active.reset();
        return preview_page(&state, &doc).await;
    }

    let decoded = decode_request_path(uri.path());
    let not_found = || PreviewError::NotFound(decoded.clone());
    let relative = resolve_request_path(&decoded).ok_or_else(not_found)?;
    let full_path = state.root.join(&relative);

    match tokio::fs::metadata(&full_path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(not_found()),
    }

    if is_document_path(&relative) {
        let doc = state.active.set(&relative.to_string_lossy());
        return preview_page(&state, &doc).await;
    }

    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|e| read_error(&relative.to_string_lossy(), e))?;
    Ok((
        [(header::CONTENT_TYPE, content_type_for_path(&relative))],
        bytes,
    )
        .into_response())
}

/// Opens a Server-Sent Events stream of change notifications for the active document.
async fn event_stream(State(state): State<AppState>, uri: Uri) -> Response {
    info!("-> GET {}", uri);
    let connection = state.broadcaster.connect();
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(connection.into_stream()),
    )
        .into_response()
}

/// Returns the freshly rendered body of the active document, without page chrome.
async fn update_fragment(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<String, PreviewError> {
    info!("-> GET {}", uri);
    let doc = state.active.get();
    render_document(&state, &doc).await
}

/// Builds the preview router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/es", get(event_stream))
        .route("/update", get(update_fragment))
        .fallback(serve_path)
        .with_state(state)
}

/// Binds the preview server to `host:port`.
///
/// # Errors
/// Returns an error if the address cannot be resolved or bound.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind preview server to {}:{}", host, port))
}

/// Serves the preview on `listener` until `shutdown_signal` changes.
///
/// - `/` and document paths render the page with the live-update client.
/// - `/es` streams change notifications.
/// - `/update` returns the rendered body only.
/// - Other existing files are passed through; missing ones get a 404.
///
/// # Returns
/// Returns `Ok(())` when the server shuts down cleanly, or an error if serving fails.
pub async fn start_server(
    listener: TcpListener,
    state: AppState,
    shutdown_signal: WatchReceiver<bool>,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("preview available at: http://{}", local_addr);

    let mut shutdown = shutdown_signal.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.changed().await.ok();
            info!("Preview server shutting down gracefully.");
        })
        .await?;

    info!("Preview server stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_content_types() {
        assert_eq!(content_type_for_path(Path::new("logo.png")), "image/png");
        assert_eq!(content_type_for_path(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(
            content_type_for_path(Path::new("site.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(
            content_type_for_path(Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(decode_request_path("/my%20notes.md"), "/my notes.md");
        assert_eq!(decode_request_path("/plain.md"), "/plain.md");
    }

    #[test]
    fn resolves_relative_request_paths() {
        assert_eq!(
            resolve_request_path("/docs/a.md"),
            Some(PathBuf::from("docs/a.md"))
        );
        assert_eq!(
            resolve_request_path("/./notes.md"),
            Some(PathBuf::from("notes.md"))
        );
    }

    #[test]
    fn rejects_escaping_or_empty_paths() {
        assert_eq!(resolve_request_path("/../secret.md"), None);
        assert_eq!(resolve_request_path("/docs/../../x"), None);
        assert_eq!(resolve_request_path("/"), None);
        assert_eq!(resolve_request_path(""), None);
    }
}
