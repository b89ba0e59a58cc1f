//! Credential value threading.
//!
//! Remote calls never read ambient process state; callers obtain an
//! [`AccessToken`] once and pass it into each client constructor.

use std::fmt;
use std::process::Command;

use crate::error::CloudError;

/// A bearer token for the cloud APIs.
///
/// `Debug` is redacted so tokens never end up in logs or error chains.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Obtain a token from the operator's `gcloud` session.
    pub fn from_gcloud() -> Result<Self, CloudError> {
        let output = run_gcloud(&["auth", "print-access-token"])?;
        let token = output.trim();
        if token.is_empty() {
            return Err(CloudError::Command {
                program: "gcloud".to_string(),
                detail: "auth print-access-token returned nothing; run `gcloud auth login`"
                    .to_string(),
            });
        }
        Ok(Self(token.to_string()))
    }

    /// `Authorization` header value.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Run `gcloud` with `args` and return trimmed stdout.
pub(crate) fn run_gcloud(args: &[&str]) -> Result<String, CloudError> {
    let output = Command::new("gcloud")
        .args(args)
        .output()
        .map_err(|e| CloudError::Command {
            program: "gcloud".to_string(),
            detail: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(CloudError::Command {
            program: "gcloud".to_string(),
            detail: format!(
                "`gcloud {}` exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_leaks_the_token() {
        let token = AccessToken::new("ya29.super-secret");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn bearer_header_shape() {
        let token = AccessToken::new("abc");
        assert_eq!(token.bearer(), "Bearer abc");
    }
}
