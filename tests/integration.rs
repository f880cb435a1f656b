// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for jenkup

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

/// Test the version command
#[test]
fn test_version_command() {
    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("jenkup"))
        .stdout(predicate::str::contains("Debian-family"));
}

/// Test the help output
#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("status"));
}

/// Test init command creates config file
#[test]
fn test_init_creates_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("init");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    assert!(config_path.exists());
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("SPDX-License-Identifier"));
    assert!(content.contains("key_url"));
    assert!(content.contains("[jenkins]"));
}

/// Test init refuses to overwrite without --force
#[test]
fn test_init_refuses_overwrite() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");
    std::fs::write(&config_path, "old content").unwrap();

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("init");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

/// Test init with --force overwrites existing config
#[test]
fn test_init_force() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");
    std::fs::write(&config_path, "old content").unwrap();

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("init")
        .arg("--force");
    cmd.assert().success();

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(!content.contains("old content"));
    assert!(content.contains("name = \"jenkup\""));
}

/// Test config command shows defaults when no file exists
#[test]
fn test_config_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nonexistent.toml");

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Using defaults"))
        .stdout(predicate::str::contains("openjdk-17-jdk"))
        .stdout(predicate::str::contains("pkg.jenkins.io"));
}

/// Test config command rejects an invalid file
#[test]
fn test_config_invalid_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");
    std::fs::write(
        &config_path,
        r#"
[jenkins]
key_url = "ftp://not-a-web-url/key"
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("config");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("http(s) URL"));
}

/// Test plan lists the six steps in order
#[test]
fn test_plan_output() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nonexistent.toml");

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("plan");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("6 steps"))
        .stdout(predicate::str::contains("1. Refresh package index"))
        .stdout(predicate::str::contains("Install package 'openjdk-17-jdk'"))
        .stdout(predicate::str::contains("Fetch signing key"))
        .stdout(predicate::str::contains("Register source"))
        .stdout(predicate::str::contains("6. Install package 'jenkins'"));
}

/// Test plan respects a custom configuration
#[test]
fn test_plan_custom_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");
    std::fs::write(
        &config_path,
        r#"
[java]
package = "openjdk-21-jdk"

[jenkins]
repo_url = "https://pkg.jenkins.io/debian"
key_url = "https://pkg.jenkins.io/debian/jenkins.io-2023.key"
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config").arg(&config_path).arg("plan");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("openjdk-21-jdk"))
        .stdout(predicate::str::contains("https://pkg.jenkins.io/debian "));
}

/// Test plan JSON output is machine-readable
#[test]
fn test_plan_json() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nonexistent.toml");

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("plan")
        .arg("--format")
        .arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();

    let steps: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let steps = steps.as_array().unwrap();
    assert_eq!(steps.len(), 6);
    assert_eq!(steps[0]["type"], "refresh-index");
    assert_eq!(steps[5]["type"], "install-package");
    assert_eq!(steps[5]["package"], "jenkins");
}

/// Test provisioning in dry-run mode executes nothing
#[test]
fn test_provision_dry_run() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("jenkup.toml");
    let keyring_path = temp_dir.path().join("jenkins-keyring.asc");
    let list_path = temp_dir.path().join("jenkins.list");

    std::fs::write(
        &config_path,
        format!(
            r#"
[jenkins]
keyring_path = "{}"
source_list_path = "{}"
"#,
            keyring_path.display(),
            list_path.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .arg("provision");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("would"))
        .stdout(predicate::str::contains("no changes made"));

    assert!(!keyring_path.exists());
    assert!(!list_path.exists());
}

/// Test dry-run report in JSON form
#[test]
fn test_provision_dry_run_json() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nonexistent.toml");

    let mut cmd = Command::cargo_bin("jenkup").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .arg("provision")
        .arg("--format")
        .arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();

    // JSON mode emits a single document with no banner around it.
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(report["success"], true);
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["steps"].as_array().unwrap().len(), 6);
    assert_eq!(report["steps"][0]["outcome"], "would-change");
}
