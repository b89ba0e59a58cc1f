//! # stratus-deploy
//!
//! Content fingerprinting, artifact packaging, and the deploy reconciler.
//!
//! Call [`reconcile_at`] to converge a single service with its remote
//! deployment, or [`reconcile_all_at`] to process every registered service.

pub mod archive;
pub mod builder;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod reconciler;

pub use builder::{BuildTool, MavenBuild};
pub use error::DeployError;
pub use fingerprint::fingerprint_dir;
pub use pipeline::DeployScope;
pub use reconciler::{
    classify, reconcile_all_at, reconcile_at, status_at, BatchEntry, Collaborators, DeployOutcome,
    ServiceState, ServiceStatus,
};
