//! stratus — serverless template scaffolding and deploy CLI.
//!
//! # Usage
//!
//! ```text
//! stratus init base --name <name> [--project-id <id>] [--location <loc>]
//! stratus init service <name> --env python|nodejs|go|java [--trigger http|pubsub|storage]
//! stratus deploy <service> [--location <loc>]
//! stratus deploy --all
//! stratus status [--json]
//! stratus gcloud projects
//! stratus gcloud locations [<project-id>]
//! stratus gcloud credentials <name> [--display-name <name>] [--project-id <id>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    deploy::DeployArgs,
    gcloud::GcloudCommand,
    init::InitCommand,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stratus",
    version,
    about = "Scaffold and deploy serverless functions from reusable templates",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the workspace spec or scaffold a new service.
    Init {
        #[command(subcommand)]
        command: InitCommand,
    },

    /// Deploy a stale service, or every stale service with --all.
    Deploy(DeployArgs),

    /// Show local deployment staleness for registered services.
    Status(StatusArgs),

    /// Query the operator's cloud session (projects, locations).
    Gcloud {
        #[command(subcommand)]
        command: GcloudCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init { command } => commands::init::run(command),
        Commands::Deploy(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Gcloud { command } => commands::gcloud::run(command),
    }
}
