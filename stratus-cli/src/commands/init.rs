//! `stratus init base` and `stratus init service <name>`.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use stratus_cloud::{discovery, AccessToken};
use stratus_core::{
    spec_store::{self, WorkspaceInit},
    Runtime, Trigger,
};
use stratus_scaffold::{register_at, RegisterRequest};
use stratus_templates::{HttpTemplateSource, DEFAULT_TEMPLATE_BASE_URL};

#[derive(Subcommand, Debug)]
pub enum InitCommand {
    /// Write the workspace spec (`stratus.json`) into the current directory.
    Base(BaseArgs),

    /// Scaffold a new service from its template and register it.
    Service(ServiceArgs),
}

pub fn run(command: InitCommand) -> Result<()> {
    match command {
        InitCommand::Base(args) => base(args),
        InitCommand::Service(args) => service(args),
    }
}

// ---------------------------------------------------------------------------
// init base
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Project name.
    #[arg(long)]
    pub name: String,

    /// A little about the project.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Cloud project id. Discovered from the active gcloud session when
    /// omitted.
    #[arg(long = "project-id")]
    pub project_id: Option<String>,

    /// Default deploy location. The first location available to the project
    /// is used when omitted.
    #[arg(long)]
    pub location: Option<String>,

    /// Project version.
    #[arg(long, default_value = "0.1.0")]
    pub version: String,
}

fn base(args: BaseArgs) -> Result<()> {
    let workspace = workspace_dir()?;

    let project_id = match args.project_id {
        Some(id) => id,
        None => discovery::active_project_id()
            .context("no --project-id given and no active gcloud project")?,
    };

    let default_location = match args.location {
        Some(location) => location,
        None => {
            let token = AccessToken::from_gcloud().context("cannot obtain an access token")?;
            let locations = discovery::list_locations(&token, &project_id)
                .with_context(|| format!("cannot list locations for '{project_id}'"))?;
            locations
                .into_iter()
                .next()
                .with_context(|| format!("project '{project_id}' exposes no locations"))?
        }
    };

    let spec = spec_store::init_at(
        &workspace,
        WorkspaceInit {
            name: args.name,
            cloud_project_id: project_id,
            description: args.description,
            default_location,
            version: args.version,
        },
    )
    .context("failed to initialize the workspace")?;

    println!(
        "✓ Initialized workspace '{}' for project '{}'",
        spec.name, spec.cloud_project_id
    );
    println!("  Default location: {}", spec.default_location);
    println!("  Spec: ./{}", spec_store::SPEC_FILE);
    Ok(())
}

// ---------------------------------------------------------------------------
// init service
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ServiceArgs {
    /// Service name (normalized to a lowercase dashed key).
    pub name: String,

    /// Runtime: python | nodejs | go | java.
    #[arg(long, short = 'e')]
    pub env: Runtime,

    /// Invocation trigger: http | pubsub | storage.
    #[arg(long, short = 't', default_value = "http")]
    pub trigger: String,

    /// Topic emitting events (pubsub trigger only).
    #[arg(long)]
    pub topic: Option<String>,

    /// Bucket emitting events (storage trigger only).
    #[arg(long)]
    pub bucket: Option<String>,

    /// A little about the service.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Deploy location; the project default applies when omitted.
    #[arg(long)]
    pub location: Option<String>,

    /// Service version.
    #[arg(long, default_value = "0.1.0")]
    pub version: String,

    /// Grant invocation to any caller after deploy.
    #[arg(long)]
    pub allow_public: bool,

    /// Template store base URL override.
    #[arg(long)]
    pub template_base: Option<String>,
}

fn service(args: ServiceArgs) -> Result<()> {
    let workspace = workspace_dir()?;
    let trigger = build_trigger(&args.trigger, args.topic, args.bucket)?;

    let base_url = args
        .template_base
        .unwrap_or_else(|| DEFAULT_TEMPLATE_BASE_URL.to_string());
    let source = HttpTemplateSource::new(base_url);

    let name = args.name.clone();
    let service = register_at(
        &workspace,
        RegisterRequest {
            name: args.name,
            description: args.description,
            environment: args.env,
            trigger,
            location_id: args.location,
            version: args.version,
            allow_public_invoke: args.allow_public,
        },
        &source,
    )
    .with_context(|| format!("failed to register '{name}'"))?;

    println!(
        "✓ Registered '{}' ({} / {})",
        service.name, service.environment, service.trigger
    );
    println!("  Source: {}", service.source_dir.display());
    println!("  Deploy with: stratus deploy {}", service.name);
    Ok(())
}

fn build_trigger(kind: &str, topic: Option<String>, bucket: Option<String>) -> Result<Trigger> {
    match kind.to_ascii_lowercase().as_str() {
        "http" => Ok(Trigger::Http),
        "pubsub" => {
            let topic = topic.context("--trigger pubsub requires --topic")?;
            Ok(Trigger::Pubsub { topic })
        }
        "storage" => {
            let bucket = bucket.context("--trigger storage requires --bucket")?;
            Ok(Trigger::Storage { bucket })
        }
        other => bail!("unknown trigger '{other}'; expected: http, pubsub, storage"),
    }
}

pub(crate) fn workspace_dir() -> Result<PathBuf> {
    env::current_dir().context("cannot determine the current directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_parsing_enforces_resources() {
        assert_eq!(build_trigger("http", None, None).unwrap(), Trigger::Http);
        assert!(build_trigger("pubsub", None, None).is_err());
        assert_eq!(
            build_trigger("pubsub", Some("jobs".into()), None).unwrap(),
            Trigger::Pubsub {
                topic: "jobs".into()
            }
        );
        assert!(build_trigger("storage", None, None).is_err());
        assert!(build_trigger("cron", None, None).is_err());
    }
}
