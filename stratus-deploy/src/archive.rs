//! Deploy artifact packaging.
//!
//! Packages a deploy root into `build/<service>.zip`, skipping any file whose
//! workspace-relative path contains an entry from the `.stratusignore` list
//! (a YAML sequence of substrings at the workspace root).

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{io_err, DeployError};

/// Directory receiving deploy artifacts, relative to the workspace root.
pub const BUILD_DIR: &str = "build";

/// Well-known name of the ignore list at the workspace root.
pub const IGNORE_FILE: &str = ".stratusignore";

/// Load the workspace ignore list. A missing file means "ignore nothing".
pub fn load_ignore_at(workspace: &Path) -> Result<Vec<String>, DeployError> {
    let path = workspace.join(IGNORE_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| DeployError::IgnoreList { path, source })
}

/// Compress `deploy_root` into a single zip at `target`, excluding paths
/// that match the ignore list. Returns the archive path.
pub fn compress_dir(
    deploy_root: &Path,
    target: &Path,
    ignore: &[String],
) -> Result<PathBuf, DeployError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let file = std::fs::File::create(target).map_err(|e| io_err(target, e))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::new();
    for entry in WalkDir::new(deploy_root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(deploy_root).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(deploy_root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if ignore.iter().any(|pattern| relative.contains(pattern)) {
            tracing::debug!("ignored: {relative}");
            continue;
        }
        entries.push((relative, entry.path().to_path_buf()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (relative, path) in entries {
        let mut source = std::fs::File::open(&path).map_err(|e| io_err(&path, e))?;
        let mut contents = Vec::new();
        source
            .read_to_end(&mut contents)
            .map_err(|e| io_err(&path, e))?;
        writer.start_file(relative, options)?;
        writer.write_all(&contents).map_err(|e| io_err(target, e))?;
    }
    writer.finish()?;

    tracing::info!("packaged {}", target.display());
    Ok(target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn entry_names(archive_path: &Path) -> Vec<String> {
        let file = fs::File::open(archive_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn archive_contains_relative_paths() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("lib")).unwrap();
        fs::write(root.path().join("main.py"), "code").unwrap();
        fs::write(root.path().join("lib/util.py"), "more").unwrap();

        let target = out.path().join("svc.zip");
        compress_dir(root.path(), &target, &[]).expect("compress");

        let names = entry_names(&target);
        assert_eq!(names, vec!["lib/util.py", "main.py"]);
    }

    #[test]
    fn ignore_list_excludes_matching_paths() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("__pycache__")).unwrap();
        fs::write(root.path().join("main.py"), "code").unwrap();
        fs::write(root.path().join("__pycache__/main.cpython-39.pyc"), "bin").unwrap();
        fs::write(root.path().join("notes.local"), "scratch").unwrap();

        let target = out.path().join("svc.zip");
        let ignore = vec!["__pycache__".to_string(), ".local".to_string()];
        compress_dir(root.path(), &target, &ignore).expect("compress");

        assert_eq!(entry_names(&target), vec!["main.py"]);
    }

    #[test]
    fn missing_ignore_file_means_empty_list() {
        let ws = TempDir::new().unwrap();
        assert!(load_ignore_at(ws.path()).expect("load").is_empty());
    }

    #[test]
    fn ignore_file_parses_yaml_sequence() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join(IGNORE_FILE), "- .git\n- node_modules\n").unwrap();
        let ignore = load_ignore_at(ws.path()).expect("load");
        assert_eq!(ignore, vec![".git".to_string(), "node_modules".to_string()]);
    }

    #[test]
    fn malformed_ignore_file_is_reported() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join(IGNORE_FILE), "{ not: [valid").unwrap();
        let err = load_ignore_at(ws.path()).unwrap_err();
        assert!(matches!(err, DeployError::IgnoreList { .. }), "got: {err}");
    }
}
