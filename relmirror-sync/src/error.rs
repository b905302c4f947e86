//! Error types for relmirror-sync.
//!
//! Anything surfacing as a [`SyncError`] is fatal for the pass. Failures
//! local to one asset or one uploaded file are logged and counted instead.

use std::path::PathBuf;

use thiserror::Error;

use relmirror_client::ClientError;
use relmirror_renderer::RenderError;

/// All errors that abort a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A listing or metadata request failed.
    #[error("registry error: {0}")]
    Client(#[from] ClientError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tag or file name that cannot be used as a single path component.
    #[error("refusing unsafe staging name {name:?}")]
    UnsafeName { name: String },

    /// A transfer task panicked or was cancelled.
    #[error("{stage} task failed: {message}")]
    Task { stage: &'static str, message: String },

    /// The admission gate was closed while tasks were waiting on it.
    #[error("admission gate {0} closed")]
    GateClosed(&'static str),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Task`].
pub(crate) fn join_err(stage: &'static str, err: tokio::task::JoinError) -> SyncError {
    SyncError::Task {
        stage,
        message: err.to_string(),
    }
}
