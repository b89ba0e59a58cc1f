//! Object-storage collaborator: artifact bucket get-or-create and upload.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::AccessToken;
use crate::error::{body_err, http_err, io_err, CloudError};

const STORAGE_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const STORAGE_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const STORAGE_CLASS: &str = "STANDARD";

/// Handle to an existing storage bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRef {
    pub name: String,
}

/// The object-storage API as consumed by the reconciler.
pub trait ObjectStore {
    /// Return the named bucket, creating it in `location` on first use.
    fn ensure_bucket(&self, name: &str, location: &str) -> Result<BucketRef, CloudError>;

    /// Upload `archive` as `object_name` and return its durable reference.
    fn upload(
        &self,
        bucket: &BucketRef,
        object_name: &str,
        archive: &Path,
    ) -> Result<String, CloudError>;
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketInsertRequest<'a> {
    name: &'a str,
    location: &'a str,
    storage_class: &'a str,
}

#[derive(Deserialize)]
struct BucketResource {
    name: String,
}

/// ureq-backed client for the storage JSON API.
pub struct HttpStorageClient {
    agent: ureq::Agent,
    token: AccessToken,
    project_id: String,
}

impl HttpStorageClient {
    pub fn new(token: AccessToken, project_id: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            token,
            project_id: project_id.into(),
        }
    }

    fn get_bucket(&self, name: &str) -> Result<BucketRef, CloudError> {
        let url = format!("{STORAGE_API_BASE}/b/{name}");
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.token.bearer())
            .call()
            .map_err(|e| http_err(&url, e))?;
        let resource: BucketResource = response.into_json().map_err(|e| body_err(&url, e))?;
        Ok(BucketRef {
            name: resource.name,
        })
    }

    fn create_bucket(&self, name: &str, location: &str) -> Result<BucketRef, CloudError> {
        let url = format!("{STORAGE_API_BASE}/b");
        let response = self
            .agent
            .post(&url)
            .query("project", &self.project_id)
            .set("Authorization", &self.token.bearer())
            .send_json(BucketInsertRequest {
                name,
                location,
                storage_class: STORAGE_CLASS,
            })
            .map_err(|e| http_err(&url, e))?;
        let resource: BucketResource = response.into_json().map_err(|e| body_err(&url, e))?;
        Ok(BucketRef {
            name: resource.name,
        })
    }
}

impl ObjectStore for HttpStorageClient {
    fn ensure_bucket(&self, name: &str, location: &str) -> Result<BucketRef, CloudError> {
        match self.get_bucket(name) {
            Ok(bucket) => Ok(bucket),
            Err(err) if err.is_not_found() => self.create_bucket(name, location),
            Err(err) => Err(err),
        }
    }

    fn upload(
        &self,
        bucket: &BucketRef,
        object_name: &str,
        archive: &Path,
    ) -> Result<String, CloudError> {
        let bytes = std::fs::read(archive).map_err(|e| io_err(archive, e))?;
        let url = format!("{STORAGE_UPLOAD_BASE}/b/{}/o", bucket.name);
        self.agent
            .post(&url)
            .query("uploadType", "media")
            .query("name", object_name)
            .set("Authorization", &self.token.bearer())
            .set("Content-Type", "application/zip")
            .send_bytes(&bytes)
            .map_err(|e| http_err(&url, e))?;
        Ok(format!("gs://{}/{}", bucket.name, object_name))
    }
}
