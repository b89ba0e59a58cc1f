//! `stratus deploy` — reconcile one or all services with the remote platform.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use stratus_cloud::{AccessToken, HttpFunctionsClient, HttpStorageClient};
use stratus_core::spec_store;
use stratus_deploy::{
    pipeline::{self, DeployScope},
    Collaborators, DeployOutcome, MavenBuild,
};

use super::init::workspace_dir;

/// Arguments for `stratus deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Name of the service to deploy (omit when using `--all`).
    pub service: Option<String>,

    /// Reconcile every registered service.
    #[arg(long, conflicts_with = "service")]
    pub all: bool,

    /// Deploy location override for this run.
    #[arg(long)]
    pub location: Option<String>,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let workspace = workspace_dir()?;
        let spec =
            spec_store::load_at(&workspace).context("cannot load the workspace spec")?;

        let scope = if self.all {
            DeployScope::All
        } else {
            let name = self
                .service
                .context("provide a service name or use --all")?;
            DeployScope::Service {
                name,
                location: self.location,
            }
        };

        let token = AccessToken::from_gcloud().context("cannot obtain an access token")?;
        let functions = HttpFunctionsClient::new(token.clone());
        let storage = HttpStorageClient::new(token, spec.cloud_project_id.clone());
        let build = MavenBuild;
        let collab = Collaborators {
            functions: &functions,
            storage: &storage,
            build: &build,
        };

        let entries = pipeline::run(&workspace, scope, &collab).context("deploy failed")?;
        if entries.is_empty() {
            println!("No services registered. Run `stratus init service` first.");
            return Ok(());
        }

        let mut deployed = 0;
        let mut current = 0;
        let mut failed = 0;
        for entry in &entries {
            match &entry.outcome {
                Ok(outcome) => {
                    if matches!(outcome, DeployOutcome::Deployed { .. }) {
                        deployed += 1;
                    } else {
                        current += 1;
                    }
                    print_outcome(outcome);
                }
                Err(err) => {
                    failed += 1;
                    println!("{} '{}' failed: {err}", "✗".red(), entry.service);
                }
            }
        }
        if entries.len() > 1 {
            println!("{deployed} deployed, {current} already current, {failed} failed");
        }
        if failed > 0 {
            bail!("{failed} service(s) failed to deploy");
        }
        Ok(())
    }
}

fn print_outcome(outcome: &DeployOutcome) {
    match outcome {
        DeployOutcome::Deployed {
            service,
            function_path,
            created,
            ..
        } => {
            let verb = if *created { "created" } else { "updated" };
            println!(
                "{} '{service}' deployed ({verb}) → {function_path}",
                "✓".green()
            );
        }
        DeployOutcome::UpToDate { service } => {
            println!("{} '{service}' already up to date", "·".dimmed());
        }
    }
}
