//! Error types for stratus-scaffold.

use std::path::PathBuf;

use thiserror::Error;

use stratus_core::SpecError;
use stratus_templates::TemplateError;

/// All errors that can arise from service registration.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A service is already registered under the normalized name.
    /// Registration never overwrites.
    #[error("service '{name}' already exists; pick a different name")]
    AlreadyExists { name: String },

    /// The name normalizes to an empty key.
    #[error("'{raw}' does not contain any usable characters for a service name")]
    InvalidName { raw: String },

    /// The per-service source directory already exists on disk. Scaffolding
    /// never silently overwrites a tree it does not own yet.
    #[error("source directory {path} already exists")]
    SourceDirExists { path: PathBuf },

    /// An error from template resolution.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// An error from the spec store.
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

/// Convenience constructor for [`ScaffoldError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ScaffoldError {
    ScaffoldError::Io {
        path: path.into(),
        source,
    }
}
