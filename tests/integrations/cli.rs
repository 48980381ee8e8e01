//! Runs the `task-notify` binary end to end.

#[path = "../helpers/mod.rs"]
mod helpers;

use assert_cmd::Command;
use helpers::{channels_config, start_webhook, write_config, CONFIG_VARS, PLACEHOLDER_URL};
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn task_notify(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("task-notify").unwrap();
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(config.path())
        .args(["--project", "demo", "--grace-ms", "0"]);
    cmd
}

#[test]
fn test_no_channels_exits_cleanly() {
    let config = write_config(&channels_config(false, "", false));

    task_notify(&config)
        .args(["--message", "build finished"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📁 Project: demo"))
        .stdout(predicate::str::contains("📝 Task: build finished"))
        .stdout(predicate::str::contains("no notification channels enabled"))
        .stdout(predicate::str::contains("✨ Done"));
}

#[test]
fn test_placeholder_webhook_prints_setup_guide() {
    let config = write_config(&channels_config(true, PLACEHOLDER_URL, false));

    task_notify(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("❌ feishu: not configured"))
        .stdout(predicate::str::contains("To set up the chat notification"));
}

#[test]
fn test_broken_config_file_is_not_fatal() {
    let mut config = NamedTempFile::new().unwrap();
    write!(config, "{{ definitely not json").unwrap();

    task_notify(&config)
        .arg("--no-sound")
        .assert()
        .success()
        .stdout(predicate::str::contains("Could not load the config file"))
        .stdout(predicate::str::contains("no notification channels enabled"));
}

#[test]
fn test_invalid_environment_value_is_not_fatal() {
    let mut cmd = Command::cargo_bin("task-notify").unwrap();
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }

    cmd.env_remove("RUST_LOG")
        .env("TASK_NOTIFY_GRACE_PERIOD_MS", "soon")
        .args(["--config", "/nonexistent/notify.json"])
        .args(["--project", "demo", "--no-sound", "--grace-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid configuration in the environment"))
        .stdout(predicate::str::contains("📁 Project: demo"))
        .stdout(predicate::str::contains("no notification channels enabled"))
        .stdout(predicate::str::contains("✨ Done"));
}

#[test]
fn test_missing_sound_program_fails_run() {
    let config = write_config(&channels_config(false, "", true));

    task_notify(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("❌ sound"))
        .stdout(predicate::str::contains("No notification was delivered"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_webhook_flag_delivers_chat_message() {
    let server = start_webhook(json!({"code": 0, "msg": "success"}), 1).await;
    let url = format!("{}/hook", server.uri());
    let config = write_config(&channels_config(false, "", false));

    let assert = tokio::task::spawn_blocking(move || {
        task_notify(&config)
            .args(["--task", "build finished", "--webhook", &url, "--format", "text"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("[feishu]"))
        .stdout(predicate::str::contains("✅ feishu (chat message)"))
        .stdout(predicate::str::contains("🎯 Expect: chat message"));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["msg_type"], "text");
    assert!(body["content"]["text"]
        .as_str()
        .unwrap()
        .starts_with("demo: build finished"));
}
