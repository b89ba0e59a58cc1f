//! `stratus status` — local staleness visibility, no remote calls.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stratus_deploy::{status_at, ServiceState, ServiceStatus};

use super::init::workspace_dir;

/// Arguments for `stratus status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let workspace = workspace_dir()?;
        let statuses = status_at(&workspace).context("cannot read workspace status")?;

        if statuses.is_empty() {
            println!("No services registered. Run `stratus init service` first.");
            return Ok(());
        }

        if self.json {
            print_json(&statuses)?;
            return Ok(());
        }
        print_table(&statuses);
        Ok(())
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "service")]
    service: String,
    #[tabled(rename = "runtime")]
    runtime: String,
    #[tabled(rename = "trigger")]
    trigger: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "location")]
    location: String,
}

#[derive(Serialize)]
struct StatusRowJson {
    service: String,
    runtime: String,
    trigger: String,
    state: String,
    location: String,
    checksum: String,
}

fn print_table(statuses: &[ServiceStatus]) {
    let rows: Vec<StatusRow> = statuses
        .iter()
        .map(|status| StatusRow {
            service: status.service.name.to_string(),
            runtime: status.service.environment.to_string(),
            trigger: status.service.trigger.kind().to_string(),
            state: status.state.to_string(),
            location: if status.service.location_id.is_empty() {
                "-".to_string()
            } else {
                status.service.location_id.clone()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let stale = statuses
        .iter()
        .filter(|status| status.state != ServiceState::UpToDate)
        .count();
    if stale == 0 {
        println!("{}", "All services up to date.".green());
    } else {
        println!(
            "{}",
            format!("{stale} service(s) need a deploy.").yellow()
        );
    }
}

fn print_json(statuses: &[ServiceStatus]) -> Result<()> {
    let rows: Vec<StatusRowJson> = statuses
        .iter()
        .map(|status| StatusRowJson {
            service: status.service.name.to_string(),
            runtime: status.service.environment.to_string(),
            trigger: status.service.trigger.kind().to_string(),
            state: status.state.to_string(),
            location: status.service.location_id.clone(),
            checksum: status.service.checksum.clone(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
