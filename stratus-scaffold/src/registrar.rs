//! Service registrar.
//!
//! Registration normalizes the requested name, refuses registry conflicts,
//! materializes the service's source directory from its cached template, and
//! records the new [`ServiceSpec`] through the spec store. After
//! registration the workspace tree gains one `src/<service>/` subtree owned
//! by that service.

use std::path::{Path, PathBuf};

use chrono::Utc;

use stratus_core::{
    spec_store, FunctionConfig, Runtime, ServiceName, ServiceSpec, TemplateKey, Trigger,
    DEFAULT_ENTRY_POINT, DESCRIPTOR_FILE,
};
use stratus_templates::{cache, TemplateSource};

use crate::error::{io_err, ScaffoldError};

/// Root of per-service source trees inside a workspace.
pub const SOURCES_DIR: &str = "src";

/// Inputs for registering one service.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    /// Raw service name; normalized before any other step.
    pub name: String,
    pub description: String,
    pub environment: Runtime,
    pub trigger: Trigger,
    /// Target location id; falls back to the project default when `None`.
    pub location_id: Option<String>,
    pub version: String,
    pub allow_public_invoke: bool,
}

/// Register a new service in the workspace.
///
/// Fails with [`ScaffoldError::AlreadyExists`] when the normalized name is
/// taken (the spec store is left untouched), and with
/// [`ScaffoldError::SourceDirExists`] when the target source directory is
/// already occupied on disk.
pub fn register_at(
    workspace: &Path,
    request: RegisterRequest,
    source: &dyn TemplateSource,
) -> Result<ServiceSpec, ScaffoldError> {
    let mut spec = spec_store::load_at(workspace)?;

    let name = ServiceName::normalize(&request.name);
    if name.as_str().is_empty() {
        return Err(ScaffoldError::InvalidName { raw: request.name });
    }
    if spec.services.contains_key(&name) {
        return Err(ScaffoldError::AlreadyExists {
            name: name.to_string(),
        });
    }

    let key = TemplateKey::new(request.environment, &request.trigger);
    let template_dir = cache::resolve_at(workspace, &mut spec, &key, source)?;

    let relative_source = Path::new(SOURCES_DIR).join(name.as_str());
    let source_dir = workspace.join(&relative_source);
    if source_dir.exists() {
        return Err(ScaffoldError::SourceDirExists { path: source_dir });
    }
    copy_tree(&template_dir, &source_dir)?;

    let location_id = request
        .location_id
        .clone()
        .unwrap_or_else(|| spec.default_location.clone());
    write_descriptor(&spec, &source_dir, &name, &location_id, &request)?;

    let service = ServiceSpec {
        name: name.clone(),
        description: request.description,
        version: request.version,
        environment: request.environment,
        trigger: request.trigger,
        location_id,
        location_name: String::new(),
        source_dir: relative_source,
        source_archive: PathBuf::new(),
        checksum: String::new(),
        allow_public_invoke: request.allow_public_invoke,
    };

    spec.services.insert(name.clone(), service);
    spec.updated_at = Utc::now();
    let saved = spec_store::save_at(workspace, &spec)?;

    Ok(saved
        .services
        .get(&name)
        .cloned()
        .expect("just-inserted service present in saved spec"))
}

/// Rewrite the copied template's descriptor with this service's metadata:
/// fully-qualified name placeholder, description, runtime id, and trigger
/// wiring. The wiring is derived here, once, and carried unchanged through
/// later deploy updates.
fn write_descriptor(
    spec: &stratus_core::ProjectSpec,
    source_dir: &Path,
    name: &ServiceName,
    location_id: &str,
    request: &RegisterRequest,
) -> Result<(), ScaffoldError> {
    let descriptor_path = source_dir.join(DESCRIPTOR_FILE);
    let mut config = if descriptor_path.exists() {
        FunctionConfig::read_from(&descriptor_path)?
    } else {
        FunctionConfig {
            name: String::new(),
            description: String::new(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            runtime: String::new(),
            https_trigger: None,
            event_trigger: None,
            source_archive_url: None,
        }
    };

    config.name = spec.function_path(location_id, name);
    config.description = request.description.clone();
    config.runtime = request.environment.remote_id().to_string();
    request
        .trigger
        .apply_to(&mut config, &spec.cloud_project_id);

    config.write_to(&descriptor_path)?;
    Ok(())
}

/// Copy a directory tree. The destination must not exist yet.
fn copy_tree(from: &Path, to: &Path) -> Result<(), ScaffoldError> {
    std::fs::create_dir_all(to).map_err(|e| io_err(to, e))?;
    let entries = std::fs::read_dir(from).map_err(|e| io_err(from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(from, e))?;
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if file_type.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| io_err(&target, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn copy_tree_replicates_nested_layout() {
        let from = TempDir::new().unwrap();
        let to = TempDir::new().unwrap();
        std::fs::create_dir_all(from.path().join("lib")).unwrap();
        std::fs::write(from.path().join("main.py"), "x").unwrap();
        std::fs::write(from.path().join("lib/util.py"), "y").unwrap();

        let dest = to.path().join("svc");
        copy_tree(from.path(), &dest).expect("copy");
        assert!(dest.join("main.py").is_file());
        assert!(dest.join("lib/util.py").is_file());
    }
}
