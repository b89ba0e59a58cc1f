//! Template cache — at-most-once fetch per `(runtime, trigger)` key.
//!
//! The cache index lives in `ProjectSpec.templates`; the cached trees live
//! under `<workspace>/templates/<runtime>/<trigger>/`. A recorded key is
//! returned without any network access; a missing key triggers exactly one
//! fetch, and the mapping is recorded only after the fetch succeeds, so a
//! failed fetch is retried rather than treated as cached.

use std::path::{Path, PathBuf};

use stratus_core::{spec_store, ProjectSpec, TemplateKey};

use crate::error::{io_err, TemplateError};
use crate::source::TemplateSource;

/// Resolve `key` to a local template directory.
///
/// On a cache hit the recorded path is returned unchanged. On a miss the
/// template is fetched into its deterministic path, the mapping is persisted
/// through the spec store, and `spec` is replaced with the persisted
/// document. Returns the absolute path to the template directory.
pub fn resolve_at(
    workspace: &Path,
    spec: &mut ProjectSpec,
    key: &TemplateKey,
    source: &dyn TemplateSource,
) -> Result<PathBuf, TemplateError> {
    if let Some(recorded) = spec.templates.get(key.as_str()) {
        return Ok(workspace.join(recorded));
    }

    let relative = key.relative_dir();
    let dest = workspace.join(&relative);
    std::fs::create_dir_all(&dest).map_err(|e| io_err(&dest, e))?;

    if let Err(err) = source.fetch(key, &dest) {
        // Leave no half-extracted tree behind; the key stays unrecorded so
        // the next resolve re-attempts the fetch.
        let _ = std::fs::remove_dir_all(&dest);
        return Err(err);
    }

    spec.templates.insert(key.as_str().to_string(), relative);
    spec.updated_at = chrono::Utc::now();
    *spec = spec_store::save_at(workspace, spec)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use stratus_core::{spec_store::WorkspaceInit, Runtime, Trigger};
    use tempfile::TempDir;

    use super::*;

    /// Records every fetch; optionally fails the first N of them.
    struct ScriptedSource {
        fetched: RefCell<Vec<String>>,
        failures_remaining: RefCell<usize>,
    }

    impl ScriptedSource {
        fn new(failures: usize) -> Self {
            Self {
                fetched: RefCell::new(Vec::new()),
                failures_remaining: RefCell::new(failures),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetched.borrow().len()
        }
    }

    impl TemplateSource for ScriptedSource {
        fn fetch(&self, key: &TemplateKey, dest: &Path) -> Result<(), TemplateError> {
            self.fetched.borrow_mut().push(key.to_string());
            let mut failures = self.failures_remaining.borrow_mut();
            if *failures > 0 {
                *failures -= 1;
                return Err(TemplateError::Fetch {
                    key: key.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            std::fs::write(dest.join("function.json"), "{}").unwrap();
            std::fs::write(dest.join("main.py"), "def main(request):\n    pass\n").unwrap();
            Ok(())
        }
    }

    fn init_workspace() -> (TempDir, ProjectSpec) {
        let ws = TempDir::new().expect("tempdir");
        let spec = spec_store::init_at(
            ws.path(),
            WorkspaceInit {
                name: "acme".to_string(),
                cloud_project_id: "acme-prod".to_string(),
                description: String::new(),
                default_location: "us-east1".to_string(),
                version: "0.1.0".to_string(),
            },
        )
        .expect("init");
        (ws, spec)
    }

    #[test]
    fn miss_fetches_once_and_records_mapping() {
        let (ws, mut spec) = init_workspace();
        let source = ScriptedSource::new(0);
        let key = TemplateKey::new(Runtime::Python, &Trigger::Http);

        let path = resolve_at(ws.path(), &mut spec, &key, &source).expect("resolve");
        assert_eq!(source.fetch_count(), 1);
        assert!(path.join("function.json").is_file());
        assert_eq!(
            spec.templates.get("python/http"),
            Some(&PathBuf::from("templates/python/http"))
        );

        // The mapping survived the round-trip through disk.
        let persisted = spec_store::load_at(ws.path()).expect("load");
        assert!(persisted.templates.contains_key("python/http"));
    }

    #[test]
    fn repeated_resolves_fetch_at_most_once() {
        let (ws, mut spec) = init_workspace();
        let source = ScriptedSource::new(0);
        let key = TemplateKey::new(Runtime::Python, &Trigger::Http);

        let first = resolve_at(ws.path(), &mut spec, &key, &source).expect("first");
        for _ in 0..4 {
            // Reload from disk each round: the guarantee is per workspace
            // lifetime, not per in-memory document.
            let mut reloaded = spec_store::load_at(ws.path()).expect("load");
            let again = resolve_at(ws.path(), &mut reloaded, &key, &source).expect("again");
            assert_eq!(again, first);
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn distinct_keys_fetch_independently() {
        let (ws, mut spec) = init_workspace();
        let source = ScriptedSource::new(0);

        let http = TemplateKey::new(Runtime::Python, &Trigger::Http);
        let pubsub = TemplateKey::new(
            Runtime::Python,
            &Trigger::Pubsub {
                topic: "jobs".to_string(),
            },
        );

        let http_dir = resolve_at(ws.path(), &mut spec, &http, &source).expect("http");
        let pubsub_dir = resolve_at(ws.path(), &mut spec, &pubsub, &source).expect("pubsub");
        assert_ne!(http_dir, pubsub_dir);
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn failed_fetch_is_not_recorded_and_retries() {
        let (ws, mut spec) = init_workspace();
        let source = ScriptedSource::new(1);
        let key = TemplateKey::new(Runtime::Nodejs, &Trigger::Http);

        let err = resolve_at(ws.path(), &mut spec, &key, &source).unwrap_err();
        assert!(matches!(err, TemplateError::Fetch { .. }), "got: {err}");
        assert!(spec.templates.is_empty(), "failed fetch must not be cached");
        assert!(
            !ws.path().join("templates/nodejs/http").exists(),
            "half-extracted tree must be removed"
        );

        // Retry succeeds and records the mapping.
        let path = resolve_at(ws.path(), &mut spec, &key, &source).expect("retry");
        assert_eq!(source.fetch_count(), 2);
        assert!(path.join("main.py").is_file());
        assert!(spec.templates.contains_key("nodejs/http"));
    }
}
