//! Content fingerprinting for change detection.
//!
//! The digest is a SHA-256 over a canonical traversal: files sorted by
//! relative path, each contributing its path, length, and bytes. It is a
//! function of contents and relative paths only — never timestamps,
//! permissions, or the directory's absolute location — so copying a tree
//! elsewhere yields the same digest and any content change yields a new one.

use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{io_err, DeployError};

/// Compute the content fingerprint of a directory tree.
pub fn fingerprint_dir(dir: &Path) -> Result<String, DeployError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.push((relative, entry.path().to_path_buf()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (relative, path) in files {
        let contents = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }
    Ok(hex::encode(hasher.finalize()))
}
