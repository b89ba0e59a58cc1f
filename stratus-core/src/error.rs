//! Error types for stratus-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from spec store operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// No spec document exists — the workspace was never base-initialized.
    #[error("workspace not initialized: no spec found at {path}; run `stratus init base` first")]
    NotInitialized { path: PathBuf },

    /// A spec document exists but does not parse into the expected schema,
    /// or carries an unsupported schema version.
    #[error("spec at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// `init` was asked to create a spec where one already exists.
    #[error("workspace already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SpecError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SpecError {
    SpecError::Io {
        path: path.into(),
        source,
    }
}
