// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Errors raised while assembling the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to merge configuration: {0}")]
    Figment(#[from] figment::Error),
    #[error("preview mode requires exactly one path, got {0}")]
    PreviewPathCount(usize),
}

/// Errors from the filesystem watcher. All of them are fatal for preview mode.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create filesystem watcher: {0}")]
    Init(#[source] notify::Error),
    #[error("failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("failed to resolve watch root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("filesystem watcher reported an error: {0}")]
    Notify(#[source] notify::Error),
    #[error("filesystem watcher stopped unexpectedly")]
    RelayClosed,
}

/// Errors produced while answering a single preview request.
///
/// These never escape the request: each variant maps onto a plain-text response.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The requested URL path does not name a servable file.
    #[error("404 {0} was not found on this server.")]
    NotFound(String),
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        match &self {
            PreviewError::NotFound(_) => {
                (StatusCode::NOT_FOUND, format!("{}\n", self)).into_response()
            }
            PreviewError::Read { .. } => {
                error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", self)).into_response()
            }
        }
    }
}

/// Errors from batch conversion. Any of them aborts the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
