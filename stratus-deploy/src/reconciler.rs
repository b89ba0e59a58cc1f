//! Deploy reconciler — the create-vs-update state machine.
//!
//! ## Single-service transition
//!
//! 1. Fingerprint the source tree; `UpToDate` returns immediately with zero
//!    remote calls.
//! 2. Resolve the target location (argument → recorded → project default).
//! 3. Build (compiled runtimes only) and package the deploy root.
//! 4. Get-or-create the artifact bucket, upload, obtain the durable ref.
//! 5. Probe the remote function; patch the source reference if it exists,
//!    create from the full descriptor if not.
//! 6. Converge the authorization policy when public invocation is requested.
//! 7. On full success only: persist checksum + location + archive path as one
//!    atomic spec save.
//!
//! Any failure after the upload is a [`DeployError::PartialDeploy`]; the spec
//! store is not touched, so the service stays stale and the next
//! reconciliation retries the whole transition.

use std::fmt;
use std::path::Path;

use chrono::Utc;

use stratus_cloud::{CloudError, FunctionsApi, IamPolicy, ObjectStore};
use stratus_core::{
    spec_store, FunctionConfig, ProjectSpec, ServiceName, ServiceSpec, DESCRIPTOR_FILE,
};

use crate::archive;
use crate::builder::BuildTool;
use crate::error::DeployError;
use crate::fingerprint::fingerprint_dir;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The remote collaborators a reconciliation run talks to.
pub struct Collaborators<'a> {
    pub functions: &'a dyn FunctionsApi,
    pub storage: &'a dyn ObjectStore,
    pub build: &'a dyn BuildTool,
}

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Deployment state of one service relative to its local source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// `checksum` is empty: no deploy ever succeeded.
    NeverDeployed,
    /// Current fingerprint equals the recorded checksum.
    UpToDate,
    /// Current fingerprint differs from the recorded checksum.
    Stale,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::NeverDeployed => write!(f, "never-deployed"),
            ServiceState::UpToDate => write!(f, "up-to-date"),
            ServiceState::Stale => write!(f, "stale"),
        }
    }
}

/// Classify a service against the current fingerprint of its source tree.
pub fn classify(service: &ServiceSpec, current_fingerprint: &str) -> ServiceState {
    if service.checksum.is_empty() {
        ServiceState::NeverDeployed
    } else if service.checksum == current_fingerprint {
        ServiceState::UpToDate
    } else {
        ServiceState::Stale
    }
}

/// Outcome of reconciling a single service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The service was stale and is now deployed.
    Deployed {
        service: ServiceName,
        function_path: String,
        /// True when the remote function was created rather than updated.
        created: bool,
        checksum: String,
    },
    /// No-op: the recorded checksum already matches the source tree.
    UpToDate { service: ServiceName },
}

/// One service's result in a batch run.
#[derive(Debug)]
pub struct BatchEntry {
    pub service: ServiceName,
    pub outcome: Result<DeployOutcome, DeployError>,
}

/// A service's local staleness classification, as reported by [`status_at`].
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub service: ServiceSpec,
    pub state: ServiceState,
}

// ---------------------------------------------------------------------------
// Single-service reconciliation
// ---------------------------------------------------------------------------

/// Reconcile one service: compare fingerprints, and deploy if stale.
///
/// `location` overrides the service's recorded location and the project
/// default. An up-to-date service returns [`DeployOutcome::UpToDate`]
/// without any collaborator call.
pub fn reconcile_at(
    workspace: &Path,
    name: &str,
    location: Option<&str>,
    collab: &Collaborators<'_>,
) -> Result<DeployOutcome, DeployError> {
    let mut spec = spec_store::load_at(workspace)?;
    let key = ServiceName::normalize(name);
    let service = spec
        .services
        .get(&key)
        .cloned()
        .ok_or_else(|| DeployError::ServiceNotFound {
            name: key.to_string(),
        })?;

    let source_dir = workspace.join(&service.source_dir);
    let current = fingerprint_dir(&source_dir)?;
    if current == service.checksum {
        tracing::debug!("'{key}' is up to date");
        return Ok(DeployOutcome::UpToDate { service: key });
    }

    let location_id =
        resolve_location(location, &service, &spec).ok_or_else(|| DeployError::NoLocation {
            service: key.to_string(),
        })?;
    let location_path = spec.location_path(&location_id);
    let function_path = spec.function_path(&location_id, &key);

    // Capability dispatch: compiled runtimes deploy their build output.
    let deploy_root = if service.environment.needs_build() {
        collab.build.build(&source_dir)?
    } else {
        source_dir.clone()
    };

    let ignore = archive::load_ignore_at(workspace)?;
    let archive_relative = Path::new(archive::BUILD_DIR).join(format!("{key}.zip"));
    let archive_path = workspace.join(&archive_relative);
    archive::compress_dir(&deploy_root, &archive_path, &ignore)?;

    // The deploy payload is derived in memory from the registration-time
    // descriptor; the descriptor on disk is never rewritten here, which
    // keeps the fingerprint of the source tree stable across deploys.
    let mut payload = FunctionConfig::read_from(&source_dir.join(DESCRIPTOR_FILE))?;
    payload.name = function_path.clone();

    let bucket = collab
        .storage
        .ensure_bucket(&spec.artifact_bucket(), &location_id)?;
    let durable_ref = collab
        .storage
        .upload(&bucket, &format!("{key}.zip"), &archive_path)?;
    payload.source_archive_url = Some(durable_ref);

    // From here on the artifact is uploaded: failures are partial deploys.
    let exists = collab
        .functions
        .function_exists(&function_path)
        .map_err(|e| partial(&key, "probe", e))?;
    if exists {
        collab
            .functions
            .patch_function_source(&function_path, &payload)
            .map_err(|e| partial(&key, "update", e))?;
    } else {
        collab
            .functions
            .create_function(&location_path, &payload)
            .map_err(|e| partial(&key, "create", e))?;
    }

    if service.allow_public_invoke {
        converge_public_policy(&key, &function_path, collab.functions)?;
    }

    let entry = spec
        .services
        .get_mut(&key)
        .expect("service disappeared mid-reconcile");
    entry.checksum = current.clone();
    entry.location_id = location_id;
    entry.location_name = location_path;
    entry.source_archive = archive_relative;
    spec.updated_at = Utc::now();
    spec_store::save_at(workspace, &spec)?;

    tracing::info!(
        "deployed '{key}' ({})",
        if exists { "update" } else { "create" }
    );
    Ok(DeployOutcome::Deployed {
        service: key,
        function_path,
        created: !exists,
        checksum: current,
    })
}

/// Apply the all-callers invoker binding when the remote policy is empty.
///
/// The check is existence-of-any-binding, not existence of the specific
/// invoker binding; a policy carrying unrelated bindings is treated as
/// already authorized.
fn converge_public_policy(
    service: &ServiceName,
    function_path: &str,
    functions: &dyn FunctionsApi,
) -> Result<(), DeployError> {
    let policy = functions
        .get_iam_policy(function_path)
        .map_err(|e| partial(service, "get-policy", e))?;
    if policy.has_bindings() {
        return Ok(());
    }
    functions
        .set_iam_policy(function_path, &IamPolicy::public_invoker())
        .map_err(|e| partial(service, "set-policy", e))?;
    tracing::info!("granted public invocation on '{service}'");
    Ok(())
}

fn resolve_location(
    explicit: Option<&str>,
    service: &ServiceSpec,
    spec: &ProjectSpec,
) -> Option<String> {
    if let Some(location) = explicit {
        if !location.is_empty() {
            return Some(location.to_string());
        }
    }
    if !service.location_id.is_empty() {
        return Some(service.location_id.clone());
    }
    if !spec.default_location.is_empty() {
        return Some(spec.default_location.clone());
    }
    None
}

fn partial(service: &ServiceName, step: &'static str, source: CloudError) -> DeployError {
    DeployError::PartialDeploy {
        service: service.to_string(),
        step,
        source,
    }
}

// ---------------------------------------------------------------------------
// Batch reconciliation
// ---------------------------------------------------------------------------

/// Reconcile every registered service, in registry order.
///
/// Per-service failures are isolated: one failing service never prevents the
/// remaining services from being evaluated. The entries report which services
/// were redeployed and which were already current.
pub fn reconcile_all_at(
    workspace: &Path,
    collab: &Collaborators<'_>,
) -> Result<Vec<BatchEntry>, DeployError> {
    let spec = spec_store::load_at(workspace)?;
    let names: Vec<ServiceName> = spec.services.keys().cloned().collect();

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let outcome = reconcile_at(workspace, name.as_str(), None, collab);
        if let Err(err) = &outcome {
            tracing::warn!("reconcile failed for '{name}': {err}");
        }
        entries.push(BatchEntry {
            service: name,
            outcome,
        });
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Local status
// ---------------------------------------------------------------------------

/// Classify every registered service without any remote call.
pub fn status_at(workspace: &Path) -> Result<Vec<ServiceStatus>, DeployError> {
    let spec = spec_store::load_at(workspace)?;
    let mut statuses = Vec::with_capacity(spec.services.len());
    for service in spec.services.values() {
        let current = fingerprint_dir(&workspace.join(&service.source_dir))?;
        statuses.push(ServiceStatus {
            service: service.clone(),
            state: classify(service, &current),
        });
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use stratus_core::{Runtime, Trigger};

    use super::*;

    fn service(checksum: &str, location_id: &str) -> ServiceSpec {
        ServiceSpec {
            name: ServiceName::normalize("svc"),
            description: String::new(),
            version: "0.1.0".to_string(),
            environment: Runtime::Python,
            trigger: Trigger::Http,
            location_id: location_id.to_string(),
            location_name: String::new(),
            source_dir: PathBuf::from("src/svc"),
            source_archive: PathBuf::new(),
            checksum: checksum.to_string(),
            allow_public_invoke: false,
        }
    }

    fn project(default_location: &str) -> ProjectSpec {
        let now = Utc::now();
        ProjectSpec {
            spec_version: stratus_core::SPEC_VERSION,
            name: "acme".to_string(),
            cloud_project_id: "acme-prod".to_string(),
            description: String::new(),
            default_location: default_location.to_string(),
            version: "0.1.0".to_string(),
            templates: BTreeMap::new(),
            services: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn classify_covers_all_three_states() {
        assert_eq!(classify(&service("", ""), "abc"), ServiceState::NeverDeployed);
        assert_eq!(classify(&service("abc", ""), "abc"), ServiceState::UpToDate);
        assert_eq!(classify(&service("abc", ""), "def"), ServiceState::Stale);
    }

    #[test]
    fn location_resolution_precedence() {
        let spec = project("default-loc");
        let with_recorded = service("", "recorded-loc");
        let without_recorded = service("", "");

        assert_eq!(
            resolve_location(Some("explicit"), &with_recorded, &spec).as_deref(),
            Some("explicit")
        );
        assert_eq!(
            resolve_location(None, &with_recorded, &spec).as_deref(),
            Some("recorded-loc")
        );
        assert_eq!(
            resolve_location(None, &without_recorded, &spec).as_deref(),
            Some("default-loc")
        );
        assert_eq!(
            resolve_location(None, &without_recorded, &project("")),
            None
        );
    }
}
