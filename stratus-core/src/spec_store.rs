//! Workspace spec persistence.
//!
//! # Storage layout
//!
//! ```text
//! <workspace>/
//!   stratus.json    (ProjectSpec document — single source of truth)
//!   templates/      (cached template trees, tracked in ProjectSpec.templates)
//!   src/<service>/  (per-service source trees, tracked in ProjectSpec.services)
//!   build/          (deploy artifacts)
//! ```
//!
//! # API pattern
//!
//! Every function takes the workspace root explicitly (`_at` form). `save_at`
//! is the only mutation primitive: every other component composes
//! read-then-modify-then-save. Writes are full atomic replaces of the whole
//! document (serialize → `.json.tmp` sibling → rename), never partial patches.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{io_err, SpecError};
use crate::types::{ProjectSpec, SPEC_VERSION};

/// Well-known name of the spec document inside a workspace.
pub const SPEC_FILE: &str = "stratus.json";

/// `<workspace>/stratus.json` — pure, no I/O.
pub fn spec_path_at(workspace: &Path) -> PathBuf {
    workspace.join(SPEC_FILE)
}

/// Whether a spec document exists in `workspace`.
pub fn is_initialized_at(workspace: &Path) -> bool {
    spec_path_at(workspace).exists()
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the workspace spec.
///
/// Returns [`SpecError::NotInitialized`] if the document is absent (the
/// workspace never ran base-init) and [`SpecError::Corrupt`] if it exists but
/// fails schema validation — callers can tell the two apart.
pub fn load_at(workspace: &Path) -> Result<ProjectSpec, SpecError> {
    let path = spec_path_at(workspace);
    if !path.exists() {
        return Err(SpecError::NotInitialized { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let spec: ProjectSpec = serde_json::from_str(&contents).map_err(|e| SpecError::Corrupt {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    if spec.spec_version != SPEC_VERSION {
        return Err(SpecError::Corrupt {
            path,
            reason: format!(
                "unsupported spec_version {} (expected {})",
                spec.spec_version, SPEC_VERSION
            ),
        });
    }
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the workspace spec and return what was actually persisted.
///
/// Write flow: serialize → `stratus.json.tmp` sibling → `rename`. The `.tmp`
/// lives in the same directory as the target (same filesystem, atomic rename).
/// The returned value round-trips through serialization so callers can detect
/// serialization drift.
pub fn save_at(workspace: &Path, spec: &ProjectSpec) -> Result<ProjectSpec, SpecError> {
    let path = spec_path_at(workspace);
    let tmp = path.with_file_name(format!("{SPEC_FILE}.tmp"));

    let json = serde_json::to_string_pretty(spec)?;
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }

    load_at(workspace)
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Inputs for bootstrapping a fresh workspace spec.
#[derive(Debug, Clone)]
pub struct WorkspaceInit {
    pub name: String,
    pub cloud_project_id: String,
    pub description: String,
    pub default_location: String,
    pub version: String,
}

/// Bootstrap the workspace spec document.
///
/// Refuses to overwrite an existing spec ([`SpecError::AlreadyInitialized`]).
/// Creates the `templates/` cache directory alongside the document.
pub fn init_at(workspace: &Path, init: WorkspaceInit) -> Result<ProjectSpec, SpecError> {
    let path = spec_path_at(workspace);
    if path.exists() {
        return Err(SpecError::AlreadyInitialized { path });
    }

    let now = Utc::now();
    let spec = ProjectSpec {
        spec_version: SPEC_VERSION,
        name: init.name,
        cloud_project_id: init.cloud_project_id,
        description: init.description,
        default_location: init.default_location,
        version: init.version,
        templates: Default::default(),
        services: Default::default(),
        created_at: now,
        updated_at: now,
    };

    let templates_dir = workspace.join("templates");
    std::fs::create_dir_all(&templates_dir).map_err(|e| io_err(&templates_dir, e))?;

    save_at(workspace, &spec)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
