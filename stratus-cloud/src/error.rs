//! Error types for stratus-cloud.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from cloud collaborator calls.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The remote API answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connect failures).
    #[error("transport error calling {url}: {detail}")]
    Transport { url: String, detail: String },

    /// A shelled-out command (`gcloud`, discovery) failed or was unusable.
    #[error("command `{program}` failed: {detail}")]
    Command { program: String, detail: String },

    /// JSON (de)serialization error on a request or response body.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O failure (reading an artifact for upload).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CloudError {
    /// True when the remote said "no such resource" — the signal that
    /// get-or-create callers branch on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Http { status: 404, .. })
    }
}

/// Map a ureq failure for `url` into a [`CloudError`].
pub(crate) fn http_err(url: &str, err: ureq::Error) -> CloudError {
    match err {
        ureq::Error::Status(status, response) => CloudError::Http {
            status,
            url: url.to_string(),
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => CloudError::Transport {
            url: url.to_string(),
            detail: transport.to_string(),
        },
    }
}

/// Map an unreadable or malformed response body into a [`CloudError`].
pub(crate) fn body_err(url: &str, source: std::io::Error) -> CloudError {
    CloudError::Transport {
        url: url.to_string(),
        detail: format!("invalid response body: {source}"),
    }
}

/// Convenience constructor for [`CloudError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CloudError {
    CloudError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_matches_only_404() {
        let not_found = CloudError::Http {
            status: 404,
            url: "u".into(),
            body: String::new(),
        };
        let forbidden = CloudError::Http {
            status: 403,
            url: "u".into(),
            body: String::new(),
        };
        assert!(not_found.is_not_found());
        assert!(!forbidden.is_not_found());
    }
}
