//! Shared reconciliation entrypoint used by the CLI.

use std::path::Path;

use stratus_core::ServiceName;

use crate::reconciler::{reconcile_all_at, reconcile_at, BatchEntry, Collaborators};
use crate::DeployError;

/// Scope for a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployScope {
    /// Reconcile every registered service.
    All,
    /// Reconcile a single named service, with an optional location override.
    Service {
        name: String,
        location: Option<String>,
    },
}

/// Run the reconciliation pipeline for a scope.
///
/// Batch runs isolate per-service failures inside the returned entries; a
/// single-service run propagates its failure directly.
pub fn run(
    workspace: &Path,
    scope: DeployScope,
    collab: &Collaborators<'_>,
) -> Result<Vec<BatchEntry>, DeployError> {
    match scope {
        DeployScope::All => reconcile_all_at(workspace, collab),
        DeployScope::Service { name, location } => {
            let outcome = reconcile_at(workspace, &name, location.as_deref(), collab)?;
            Ok(vec![BatchEntry {
                service: ServiceName::normalize(&name),
                outcome: Ok(outcome),
            }])
        }
    }
}
