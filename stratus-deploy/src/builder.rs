//! Build collaborator for compiled runtimes.
//!
//! Interpreted runtimes deploy their source tree directly; compiled runtimes
//! ([`Runtime::needs_build`]) run the external build tool first and deploy
//! its declared output directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::DeployError;

/// Relative output directory a successful build must produce.
const BUILD_OUTPUT_DIR: &str = "target/deploy";

/// External build tool invoked for runtimes that need compilation.
pub trait BuildTool {
    /// Build the service rooted at `service_dir` and return the deployable
    /// output directory.
    fn build(&self, service_dir: &Path) -> Result<PathBuf, DeployError>;
}

/// Maven-backed build for JVM services: `mvn clean package` in the service
/// directory, deploying `target/deploy`.
pub struct MavenBuild;

impl BuildTool for MavenBuild {
    fn build(&self, service_dir: &Path) -> Result<PathBuf, DeployError> {
        tracing::info!("building {}", service_dir.display());
        let output = Command::new("mvn")
            .args(["clean", "package", "--quiet"])
            .current_dir(service_dir)
            .output()
            .map_err(|e| DeployError::BuildFailed {
                dir: service_dir.to_path_buf(),
                detail: format!("cannot run mvn: {e}"),
            })?;

        if !output.status.success() {
            return Err(DeployError::BuildFailed {
                dir: service_dir.to_path_buf(),
                detail: format!(
                    "mvn exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let deploy_root = service_dir.join(BUILD_OUTPUT_DIR);
        if !deploy_root.is_dir() {
            return Err(DeployError::BuildFailed {
                dir: service_dir.to_path_buf(),
                detail: format!("build did not produce {BUILD_OUTPUT_DIR}"),
            });
        }
        Ok(deploy_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_build_tool_is_a_build_failure() {
        struct NoSuchTool;
        impl BuildTool for NoSuchTool {
            fn build(&self, service_dir: &Path) -> Result<PathBuf, DeployError> {
                Err(DeployError::BuildFailed {
                    dir: service_dir.to_path_buf(),
                    detail: "tool not installed".to_string(),
                })
            }
        }
        let err = NoSuchTool.build(Path::new("/tmp/svc")).unwrap_err();
        assert!(matches!(err, DeployError::BuildFailed { .. }));
        assert!(err.to_string().contains("/tmp/svc"));
    }
}
