//! Error types for stratus-templates.

use std::path::PathBuf;

use thiserror::Error;

use stratus_core::SpecError;

/// All errors that can arise from template resolution.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The remote template source could not deliver the requested key.
    #[error("failed to fetch template '{key}': {reason}")]
    Fetch { key: String, reason: String },

    /// The fetched payload was not a readable archive.
    #[error("template archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An error from the spec store while recording the cache entry.
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`TemplateError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
