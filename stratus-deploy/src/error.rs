//! Error types for stratus-deploy.

use std::path::PathBuf;

use thiserror::Error;

use stratus_cloud::CloudError;
use stratus_core::SpecError;

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Deploy was requested for a name with no registered service.
    #[error("service '{name}' is not registered in this workspace")]
    ServiceNotFound { name: String },

    /// No target location could be resolved from the argument, the service,
    /// or the project default.
    #[error("no deploy location for '{service}': pass --location or set a project default")]
    NoLocation { service: String },

    /// The external build collaborator failed for a compiled runtime.
    #[error("build failed in {dir}: {detail}")]
    BuildFailed { dir: PathBuf, detail: String },

    /// The artifact was uploaded but a later remote step failed. The spec
    /// store is deliberately left untouched, so the service stays stale and
    /// the next reconciliation retries the whole transition. The uploaded
    /// artifact is a known residue.
    #[error("partial deploy of '{service}' at step '{step}': {source}")]
    PartialDeploy {
        service: String,
        step: &'static str,
        #[source]
        source: CloudError,
    },

    /// The workspace ignore list exists but does not parse.
    #[error("ignore list {path} is invalid: {source}")]
    IgnoreList {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An error from the spec store (including corrupt descriptors).
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    /// A remote collaborator failure before any artifact was uploaded.
    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Packaging failure.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`DeployError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DeployError {
    DeployError::Io {
        path: path.into(),
        source,
    }
}
