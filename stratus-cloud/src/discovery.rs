//! Project and location discovery.
//!
//! Project listing and the active project come from the operator's `gcloud`
//! session; location listing is a REST call against the functions API.

use serde::Deserialize;

use crate::auth::{run_gcloud, AccessToken};
use crate::error::{body_err, http_err, CloudError};

const FUNCTIONS_API_BASE: &str = "https://cloudfunctions.googleapis.com/v1";

/// Project id the operator's `gcloud` session is pointed at.
pub fn active_project_id() -> Result<String, CloudError> {
    let output = run_gcloud(&["config", "get-value", "project"])?;
    let project = output.trim();
    if project.is_empty() || project == "(unset)" {
        return Err(CloudError::Command {
            program: "gcloud".to_string(),
            detail: "no active project; run `gcloud config set project <id>`".to_string(),
        });
    }
    Ok(project.to_string())
}

/// All project ids visible to the operator.
pub fn list_projects() -> Result<Vec<String>, CloudError> {
    let output = run_gcloud(&["projects", "list", "--format=value(projectId)"])?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    location_id: String,
}

/// Location ids where `project_id` can host functions.
pub fn list_locations(token: &AccessToken, project_id: &str) -> Result<Vec<String>, CloudError> {
    let url = format!("{FUNCTIONS_API_BASE}/projects/{project_id}/locations");
    let response = ureq::agent()
        .get(&url)
        .set("Authorization", &token.bearer())
        .call()
        .map_err(|e| http_err(&url, e))?;
    let parsed: LocationsResponse = response.into_json().map_err(|e| body_err(&url, e))?;
    Ok(parsed
        .locations
        .into_iter()
        .map(|location| location.location_id)
        .collect())
}
