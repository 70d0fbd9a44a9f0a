//! Tests for the `queue-inspector` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn inspector() -> Command {
    let mut cmd = Command::cargo_bin("queue-inspector").unwrap();
    cmd.env_remove("SERVICEBUS_CONNECTION_STRING")
        .env_remove("QUEUE_INSPECTOR_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("config.yaml");
    fs::write(&path, contents).unwrap();
    path.display().to_string()
}

#[test]
fn test_help_lists_commands() {
    inspector()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mcp"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_version() {
    inspector()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_config_show_redacts_secret() {
    let dir = TempDir::new().unwrap();
    let config = config_file(
        &dir,
        r#"
serviceBus:
  connectionString: "Endpoint=sb://test/;SharedAccessKey=topsecret"
  topicName: "events"
  subscriptionName: "audit"
"#,
    );

    inspector()
        .args(["--config", &config, "config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<REDACTED>"))
        .stdout(predicate::str::contains(
            "events/Subscriptions/audit/$DeadLetterQueue",
        ))
        .stdout(predicate::str::contains("topsecret").not());
}

#[test]
fn test_missing_config_exits_with_configuration_code() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml").display().to_string();

    inspector()
        .args(["--config", &missing, "config"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error reading config"));
}

#[test]
fn test_missing_connection_string_exits_with_configuration_code() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir, "serviceBus:\n  queueName: \"orders\"\n");

    inspector()
        .args(["--config", &config, "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "serviceBus.connectionString is required",
        ));
}

#[test]
fn test_connection_string_from_environment() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir, "serviceBus:\n  queueName: \"orders\"\n");

    inspector()
        .env("SERVICEBUS_CONNECTION_STRING", "Endpoint=sb://env/")
        .args(["--config", &config, "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_invalid_range_exits_with_argument_code() {
    let dir = TempDir::new().unwrap();
    let config = config_file(
        &dir,
        "serviceBus:\n  connectionString: \"Endpoint=sb://t/\"\n  queueName: \"orders\"\n",
    );

    inspector()
        .args(["--config", &config, "list", "--from", "yesterday"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("invalid `from` datetime"));
}

#[test]
fn test_completions() {
    inspector()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queue-inspector"));
}
