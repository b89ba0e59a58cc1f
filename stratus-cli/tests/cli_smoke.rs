//! CLI smoke tests: help surface and offline failure paths. No network and
//! no gcloud session is touched here.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stratus() -> Command {
    Command::cargo_bin("stratus").expect("binary built")
}

#[test]
fn help_lists_subcommands() {
    stratus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("gcloud"));
}

#[test]
fn status_fails_cleanly_outside_a_workspace() {
    let dir = TempDir::new().expect("tempdir");
    stratus()
        .arg("status")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn deploy_fails_cleanly_outside_a_workspace() {
    let dir = TempDir::new().expect("tempdir");
    stratus()
        .args(["deploy", "api"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn deploy_requires_a_name_or_all() {
    let dir = TempDir::new().expect("tempdir");
    seed_workspace(&dir);
    stratus()
        .arg("deploy")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--all"));
}

#[test]
fn init_service_requires_an_initialized_workspace() {
    let dir = TempDir::new().expect("tempdir");
    stratus()
        .args(["init", "service", "api", "--env", "python"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn status_reports_registered_services() {
    let dir = TempDir::new().expect("tempdir");
    seed_workspace(&dir);

    stratus()
        .arg("status")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("never-deployed"));
}

#[test]
fn status_json_is_machine_readable() {
    let dir = TempDir::new().expect("tempdir");
    seed_workspace(&dir);

    let output = stratus()
        .args(["status", "--json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(parsed[0]["service"], "api");
    assert_eq!(parsed[0]["state"], "never-deployed");
}

/// Hand-write a workspace with one registered python service.
fn seed_workspace(dir: &TempDir) {
    let spec = r#"{
  "spec_version": 1,
  "name": "acme",
  "cloud_project_id": "acme-prod",
  "description": "",
  "default_location": "us-east1",
  "version": "0.1.0",
  "templates": {},
  "services": {
    "api": {
      "name": "api",
      "description": "",
      "version": "0.1.0",
      "environment": "python",
      "trigger": { "kind": "http" },
      "location_id": "",
      "location_name": "",
      "source_dir": "src/api",
      "source_archive": "",
      "checksum": "",
      "allow_public_invoke": false
    }
  },
  "created_at": "2024-01-01T00:00:00Z",
  "updated_at": "2024-01-01T00:00:00Z"
}
"#;
    fs::write(dir.path().join("stratus.json"), spec).expect("write spec");
    fs::create_dir_all(dir.path().join("src/api")).expect("mkdir");
    fs::write(
        dir.path().join("src/api/main.py"),
        "def main(request):\n    return 'ok'\n",
    )
    .expect("write source");
}
