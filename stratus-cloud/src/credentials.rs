//! Service-account provisioning.
//!
//! Writes a key file for a dedicated service account into the workspace so
//! other tooling can authenticate as the project. The engine itself keeps
//! using explicit [`AccessToken`](crate::AccessToken) values; nothing here
//! mutates process environment state.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::auth::run_gcloud;
use crate::error::CloudError;

/// Well-known name of the key file inside a workspace.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Role bound to the provisioned account on the project.
const ACCOUNT_ROLE: &str = "roles/owner";

/// Look up the email of a service account whose id contains `account_name`.
pub fn service_account_email(account_name: &str) -> Result<Option<String>, CloudError> {
    let output = run_gcloud(&["iam", "service-accounts", "list", "--format=value(email)"])?;
    Ok(first_matching_email(&output, account_name))
}

/// Return the named account's email, creating the account on first use.
pub fn ensure_service_account(
    account_name: &str,
    display_name: &str,
) -> Result<String, CloudError> {
    if let Some(email) = service_account_email(account_name)? {
        return Ok(email);
    }

    run_gcloud(&[
        "iam",
        "service-accounts",
        "create",
        account_name,
        "--display-name",
        display_name,
    ])?;
    // Account listing lags creation briefly.
    thread::sleep(Duration::from_secs(2));

    service_account_email(account_name)?.ok_or_else(|| CloudError::Command {
        program: "gcloud".to_string(),
        detail: format!("service account '{account_name}' was created but is not listed yet"),
    })
}

/// Provision credentials for the workspace: ensure the service account
/// exists, write its key file to `<workspace>/credentials.json`, and bind the
/// account to the project. Returns the key file path.
pub fn create_credentials_at(
    workspace: &Path,
    account_name: &str,
    display_name: &str,
    project_id: &str,
) -> Result<PathBuf, CloudError> {
    let email = ensure_service_account(account_name, display_name)?;

    let key_path = workspace.join(CREDENTIALS_FILE);
    let key_path_arg = key_path.to_string_lossy().into_owned();
    run_gcloud(&[
        "iam",
        "service-accounts",
        "keys",
        "create",
        &key_path_arg,
        "--iam-account",
        &email,
    ])?;

    let member = format!("serviceAccount:{email}");
    run_gcloud(&[
        "projects",
        "add-iam-policy-binding",
        project_id,
        "--member",
        &member,
        "--role",
        ACCOUNT_ROLE,
    ])?;

    Ok(key_path)
}

/// First listed email whose account id matches `account_name`.
fn first_matching_email(listing: &str, account_name: &str) -> Option<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| {
            line.split('@')
                .next()
                .is_some_and(|id| id.contains(account_name))
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_email_is_picked_from_listing() {
        let listing = "\
deployer@acme-prod.iam.gserviceaccount.com
stratus-ops@acme-prod.iam.gserviceaccount.com
";
        assert_eq!(
            first_matching_email(listing, "stratus-ops").as_deref(),
            Some("stratus-ops@acme-prod.iam.gserviceaccount.com")
        );
    }

    #[test]
    fn match_is_against_the_account_id_not_the_domain() {
        let listing = "deployer@acme-prod.iam.gserviceaccount.com\n";
        assert_eq!(first_matching_email(listing, "acme-prod"), None);
        assert_eq!(first_matching_email(listing, "gserviceaccount"), None);
    }

    #[test]
    fn empty_listing_matches_nothing() {
        assert_eq!(first_matching_email("", "anything"), None);
        assert_eq!(first_matching_email("\n  \n", "anything"), None);
    }
}
