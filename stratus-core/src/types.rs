//! Domain types for the stratus workspace spec.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_json.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version of the on-disk `ProjectSpec` document.
pub const SPEC_VERSION: u32 = 1;

/// Name of the service-scoped descriptor file inside each service's
/// source directory.
pub const DESCRIPTOR_FILE: &str = "function.json";

/// Entry point written into fresh descriptors when a template ships none.
pub const DEFAULT_ENTRY_POINT: &str = "main";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A normalized service name — the key of the workspace service registry.
///
/// Normalization: lowercase, runs of non-alphanumeric characters collapsed to
/// a single `-`, leading/trailing separators trimmed. Normalizing an
/// already-normalized name is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(pub String);

impl ServiceName {
    /// Normalize a raw, user-supplied name into a registry key.
    pub fn normalize(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        let mut pending_sep = false;
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_sep && !out.is_empty() {
                    out.push('-');
                }
                pending_sep = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A template cache key: `<runtime>/<trigger kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey(String);

impl TemplateKey {
    pub fn new(environment: Runtime, trigger: &Trigger) -> Self {
        Self(format!("{}/{}", environment, trigger.kind()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Workspace-relative directory where this key's template is cached.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new("templates").join(&self.0)
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Supported function runtimes.
///
/// A closed set: each variant declares whether deploying it requires a
/// compilation step (`needs_build`) and which remote runtime id it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Python,
    Nodejs,
    Go,
    Java,
}

impl Runtime {
    /// Whether this runtime needs the external build collaborator before
    /// packaging. Compiled runtimes deploy their build output directory;
    /// everything else deploys the source tree as-is.
    pub fn needs_build(&self) -> bool {
        matches!(self, Runtime::Java)
    }

    /// Runtime id understood by the remote function-management API.
    pub fn remote_id(&self) -> &'static str {
        match self {
            Runtime::Python => "python39",
            Runtime::Nodejs => "nodejs18",
            Runtime::Go => "go121",
            Runtime::Java => "java17",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Python => write!(f, "python"),
            Runtime::Nodejs => write!(f, "nodejs"),
            Runtime::Go => write!(f, "go"),
            Runtime::Java => write!(f, "java"),
        }
    }
}

impl FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Runtime::Python),
            "nodejs" | "node" => Ok(Runtime::Nodejs),
            "go" => Ok(Runtime::Go),
            "java" => Ok(Runtime::Java),
            other => Err(format!(
                "unknown runtime '{other}'; expected: python, nodejs, go, java"
            )),
        }
    }
}

/// Invocation trigger for a service.
///
/// The wiring (HTTP endpoint vs. event source) is derived once at
/// registration and carried unchanged through deploy updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trigger {
    Http,
    Pubsub { topic: String },
    Storage { bucket: String },
}

impl Trigger {
    /// Trigger kind name — the second segment of a [`TemplateKey`].
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Http => "http",
            Trigger::Pubsub { .. } => "pubsub",
            Trigger::Storage { .. } => "storage",
        }
    }

    /// Write this trigger's invocation wiring into a function descriptor.
    pub fn apply_to(&self, config: &mut FunctionConfig, project_id: &str) {
        match self {
            Trigger::Http => {
                config.https_trigger = Some(HttpsTrigger::default());
                config.event_trigger = None;
            }
            Trigger::Pubsub { topic } => {
                config.https_trigger = None;
                config.event_trigger = Some(EventTrigger {
                    event_type: "google.pubsub.topic.publish".to_string(),
                    resource: format!("projects/{project_id}/topics/{topic}"),
                });
            }
            Trigger::Storage { bucket } => {
                config.https_trigger = None;
                config.event_trigger = Some(EventTrigger {
                    event_type: "google.storage.object.finalize".to_string(),
                    resource: format!("projects/_/buckets/{bucket}"),
                });
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

// ---------------------------------------------------------------------------
// Function descriptor
// ---------------------------------------------------------------------------

/// The service-scoped descriptor document (`function.json`) living inside a
/// service's source directory. This is the payload sent to the remote
/// function-management API on create/update, so field names follow its wire
/// casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    /// Fully-qualified function path
    /// (`projects/<p>/locations/<l>/functions/<name>`).
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entry_point: String,
    /// Remote runtime id (e.g. `python39`), not the [`Runtime`] variant name.
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_trigger: Option<HttpsTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<EventTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive_url: Option<String>,
}

impl FunctionConfig {
    /// Read a descriptor from `path`. Parse failures surface as
    /// [`crate::SpecError::Corrupt`] with the descriptor path.
    pub fn read_from(path: &Path) -> Result<Self, crate::SpecError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::error::io_err(path, e))?;
        serde_json::from_str(&contents).map_err(|e| crate::SpecError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write a descriptor to `path` as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), crate::SpecError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| crate::error::io_err(path, e))
    }
}

/// HTTP trigger wiring. The `url` is filled in by the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpsTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Event trigger wiring: event type plus the emitting resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    pub event_type: String,
    pub resource: String,
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One registered service in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: ServiceName,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub environment: Runtime,
    pub trigger: Trigger,
    /// Target location id; may be empty until the first deploy resolves one.
    #[serde(default)]
    pub location_id: String,
    /// Fully qualified remote location path; set by the reconciler after a
    /// successful deploy.
    #[serde(default)]
    pub location_name: String,
    /// Workspace-relative path to the service's source tree.
    pub source_dir: PathBuf,
    /// Workspace-relative path of the last produced artifact; may be empty.
    #[serde(default)]
    pub source_archive: PathBuf,
    /// Content fingerprint of `source_dir` as of the last successful deploy.
    /// Empty string means "never deployed".
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub allow_public_invoke: bool,
}

/// Root of the workspace spec document (`stratus.json`) — the single source
/// of truth for project and service state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub spec_version: u32,
    pub name: String,
    pub cloud_project_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_location: String,
    pub version: String,
    /// Template key (`<runtime>/<trigger>`) → workspace-relative cached path.
    /// Absence of a key means "not yet cached".
    #[serde(default)]
    pub templates: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub services: BTreeMap<ServiceName, ServiceSpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectSpec {
    /// `projects/<project>/locations/<location>`
    pub fn location_path(&self, location_id: &str) -> String {
        format!(
            "projects/{}/locations/{}",
            self.cloud_project_id, location_id
        )
    }

    /// `projects/<project>/locations/<location>/functions/<service>`
    pub fn function_path(&self, location_id: &str, service: &ServiceName) -> String {
        format!("{}/functions/{}", self.location_path(location_id), service)
    }

    /// Name of the storage bucket holding this workspace's deploy artifacts.
    pub fn artifact_bucket(&self) -> String {
        format!("{}-stratus-artifacts", self.cloud_project_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("My API!!", "my-api")]
    #[case("my-api", "my-api")]
    #[case("  Spaced  Out  ", "spaced-out")]
    #[case("UPPER_case.name", "upper-case-name")]
    #[case("v2", "v2")]
    #[case("--weird--", "weird")]
    #[case("!!!", "")]
    fn normalize_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ServiceName::normalize(raw).as_str(), expected);
    }

    #[rstest]
    #[case("My API!!")]
    #[case("a b c")]
    #[case("plain")]
    fn normalize_is_idempotent(#[case] raw: &str) {
        let once = ServiceName::normalize(raw);
        let twice = ServiceName::normalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn template_key_format_and_dir() {
        let key = TemplateKey::new(Runtime::Python, &Trigger::Http);
        assert_eq!(key.as_str(), "python/http");
        assert_eq!(key.relative_dir(), PathBuf::from("templates/python/http"));
    }

    #[test]
    fn only_java_needs_build() {
        assert!(Runtime::Java.needs_build());
        assert!(!Runtime::Python.needs_build());
        assert!(!Runtime::Nodejs.needs_build());
        assert!(!Runtime::Go.needs_build());
    }

    #[test]
    fn runtime_from_str_accepts_node_alias() {
        assert_eq!(Runtime::from_str("node").unwrap(), Runtime::Nodejs);
        assert!(Runtime::from_str("ruby").is_err());
    }

    #[test]
    fn http_trigger_wiring_is_exclusive() {
        let mut config = sample_config();
        Trigger::Http.apply_to(&mut config, "proj");
        assert!(config.https_trigger.is_some());
        assert!(config.event_trigger.is_none());
    }

    #[test]
    fn pubsub_trigger_wiring_names_topic() {
        let mut config = sample_config();
        let trigger = Trigger::Pubsub {
            topic: "orders".to_string(),
        };
        trigger.apply_to(&mut config, "proj");
        let event = config.event_trigger.expect("event trigger");
        assert_eq!(event.resource, "projects/proj/topics/orders");
        assert!(config.https_trigger.is_none());
    }

    #[test]
    fn descriptor_serializes_with_wire_casing() {
        let mut config = sample_config();
        Trigger::Http.apply_to(&mut config, "proj");
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(json.contains("\"entryPoint\""));
        assert!(json.contains("\"httpsTrigger\""));
        assert!(!json.contains("\"sourceArchiveUrl\""), "unset field must be omitted");
    }

    #[test]
    fn project_paths() {
        let spec = sample_spec();
        assert_eq!(
            spec.location_path("us-east1"),
            "projects/acme-prod/locations/us-east1"
        );
        assert_eq!(
            spec.function_path("us-east1", &ServiceName::normalize("my-api")),
            "projects/acme-prod/locations/us-east1/functions/my-api"
        );
        assert_eq!(spec.artifact_bucket(), "acme-prod-stratus-artifacts");
    }

    fn sample_config() -> FunctionConfig {
        FunctionConfig {
            name: String::new(),
            description: String::new(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            runtime: Runtime::Python.remote_id().to_string(),
            https_trigger: None,
            event_trigger: None,
            source_archive_url: None,
        }
    }

    fn sample_spec() -> ProjectSpec {
        let now = chrono::Utc::now();
        ProjectSpec {
            spec_version: SPEC_VERSION,
            name: "acme".to_string(),
            cloud_project_id: "acme-prod".to_string(),
            description: String::new(),
            default_location: "us-east1".to_string(),
            version: "0.1.0".to_string(),
            templates: BTreeMap::new(),
            services: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
