//! `stratus gcloud` — discovery and credential passthrough for the
//! operator's cloud session.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use stratus_cloud::{credentials, discovery, AccessToken};

use super::init::workspace_dir;

#[derive(Subcommand, Debug)]
pub enum GcloudCommand {
    /// List project ids visible to the operator's gcloud session.
    Projects,

    /// List function locations for a project (active project when omitted).
    Locations {
        /// Cloud project id.
        project: Option<String>,
    },

    /// Provision a service account and write its key file into the workspace.
    Credentials(CredentialsArgs),
}

#[derive(Args, Debug)]
pub struct CredentialsArgs {
    /// Service account name.
    pub name: String,

    /// Display name (defaults to the account name).
    #[arg(long = "display-name")]
    pub display_name: Option<String>,

    /// Cloud project id (active project when omitted).
    #[arg(long = "project-id")]
    pub project_id: Option<String>,
}

pub fn run(command: GcloudCommand) -> Result<()> {
    match command {
        GcloudCommand::Projects => projects(),
        GcloudCommand::Locations { project } => locations(project),
        GcloudCommand::Credentials(args) => create_credentials(args),
    }
}

fn projects() -> Result<()> {
    let projects = discovery::list_projects().context("cannot list projects")?;
    if projects.is_empty() {
        println!("No projects visible to this gcloud session.");
        return Ok(());
    }
    for project in projects {
        println!("{project}");
    }
    Ok(())
}

fn locations(project: Option<String>) -> Result<()> {
    let project = match project {
        Some(project) => project,
        None => discovery::active_project_id().context("no project given and none active")?,
    };
    let token = AccessToken::from_gcloud().context("cannot obtain an access token")?;
    let locations = discovery::list_locations(&token, &project)
        .with_context(|| format!("cannot list locations for '{project}'"))?;
    for location in locations {
        println!("{location}");
    }
    Ok(())
}

fn create_credentials(args: CredentialsArgs) -> Result<()> {
    let workspace = workspace_dir()?;
    let project = match args.project_id {
        Some(project) => project,
        None => discovery::active_project_id().context("no --project-id given and none active")?,
    };
    let display_name = args.display_name.unwrap_or_else(|| args.name.clone());

    let key_path =
        credentials::create_credentials_at(&workspace, &args.name, &display_name, &project)
            .with_context(|| format!("cannot provision credentials for '{}'", args.name))?;

    println!("✓ Wrote {} for '{}'", key_path.display(), args.name);
    Ok(())
}
