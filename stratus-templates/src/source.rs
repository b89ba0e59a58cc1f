//! Remote template source.
//!
//! Templates are published as one zip archive per `<runtime>/<trigger>` key.
//! The production source downloads `<base>/<runtime>/<trigger>.zip` and
//! unpacks it into the destination directory; tests substitute in-memory
//! sources through the [`TemplateSource`] trait.

use std::io::{Cursor, Read};
use std::path::Path;

use stratus_core::TemplateKey;

use crate::error::{io_err, TemplateError};

/// Public template store queried when a key is not yet cached.
pub const DEFAULT_TEMPLATE_BASE_URL: &str = "https://storage.googleapis.com/stratus-templates";

/// A provider of template trees, keyed by `<runtime>/<trigger>`.
pub trait TemplateSource {
    /// Materialize the template for `key` into `dest`. `dest` exists and is
    /// empty when called; on error the cache layer removes it again.
    fn fetch(&self, key: &TemplateKey, dest: &Path) -> Result<(), TemplateError>;
}

/// HTTP-backed template source.
pub struct HttpTemplateSource {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTemplateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpTemplateSource {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_BASE_URL)
    }
}

impl TemplateSource for HttpTemplateSource {
    fn fetch(&self, key: &TemplateKey, dest: &Path) -> Result<(), TemplateError> {
        let url = format!("{}/{}.zip", self.base_url, key);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| TemplateError::Fetch {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let mut payload = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut payload)
            .map_err(|e| TemplateError::Fetch {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        unpack_zip(&payload, dest)
    }
}

/// Unpack a zip payload into `dest`, skipping entries whose names would
/// escape the destination.
pub(crate) fn unpack_zip(payload: &[u8], dest: &Path) -> Result<(), TemplateError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(payload))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut out = std::fs::File::create(&target).map_err(|e| io_err(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| io_err(&target, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use stratus_core::{Runtime, Trigger};
    use tempfile::TempDir;
    use zip::write::FileOptions;

    use super::*;

    fn zip_payload(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn unpack_writes_nested_entries() {
        let dest = TempDir::new().unwrap();
        let payload = zip_payload(&[
            ("function.json", "{}"),
            ("src/main.py", "def main(request):\n    return 'ok'\n"),
        ]);
        unpack_zip(&payload, dest.path()).expect("unpack");

        assert!(dest.path().join("function.json").is_file());
        let body = std::fs::read_to_string(dest.path().join("src/main.py")).unwrap();
        assert!(body.contains("def main"));
    }

    #[test]
    fn unpack_skips_escaping_entries() {
        let dest = TempDir::new().unwrap();
        let payload = zip_payload(&[("../escape.txt", "nope"), ("ok.txt", "fine")]);
        unpack_zip(&payload, dest.path()).expect("unpack");

        assert!(dest.path().join("ok.txt").is_file());
        assert!(!dest.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn fetch_url_is_key_shaped() {
        // The URL contract is `<base>/<runtime>/<trigger>.zip`; verified
        // through the key's rendering since no network runs in tests.
        let key = TemplateKey::new(Runtime::Nodejs, &Trigger::Http);
        assert_eq!(format!("{DEFAULT_TEMPLATE_BASE_URL}/{key}.zip"),
            "https://storage.googleapis.com/stratus-templates/nodejs/http.zip");
    }
}
