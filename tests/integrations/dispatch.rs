//! End-to-end dispatch: configuration in, summary report out.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{channels_config, start_webhook, write_config, EnvGuard, CONFIG_VARS, PLACEHOLDER_URL};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use task_notify::{
    cli::Cli,
    config::Config,
    core::{ChannelError, Effect, NotificationRequest, Outcome},
    dispatcher::Dispatcher,
    report::SummaryReport,
    task_manager::TaskManager,
    test_utils::StaticChannel,
};

fn load(config: &serde_json::Value) -> Config {
    let file = write_config(config);
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    Config::load(&cli).unwrap()
}

#[tokio::test]
#[serial]
async fn test_webhook_success_end_to_end() {
    let _env = EnvGuard::clean(CONFIG_VARS);
    let server = start_webhook(json!({"code": 0}), 1).await;
    let config = load(&channels_config(true, &format!("{}/hook", server.uri()), false));

    let tasks = TaskManager::new();
    let dispatcher = Dispatcher::from_config(&config.notification, &tasks);
    let request = NotificationRequest::new("build finished", Some("demo".to_string()));

    let results = dispatcher.dispatch(&request).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].channel, "feishu");
    assert!(results[0].outcome.is_success());

    let report = SummaryReport::new(&results);
    assert!(report.all_succeeded());
    assert_eq!(report.expected_effects(), vec![Effect::ChatMessage]);
    let text = report.to_string();
    assert!(text.contains("✅ feishu"));
    assert!(text.contains("chat message"));

    // The posted title leads with the project name.
    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        body["content"]["post"]["zh_cn"]["title"],
        "demo: build finished"
    );
    assert_eq!(
        received[0].headers.get("content-length").unwrap().to_str().unwrap(),
        received[0].body.len().to_string()
    );
}

#[tokio::test]
#[serial]
async fn test_webhook_rejection_and_sound_failure_are_both_reported() {
    let _env = EnvGuard::clean(CONFIG_VARS);
    let server = start_webhook(json!({"code": 19024, "msg": "Key Words Not Found"}), 1).await;
    let config = load(&channels_config(true, &format!("{}/hook", server.uri()), true));

    let tasks = TaskManager::new();
    let dispatcher = Dispatcher::from_config(&config.notification, &tasks);
    let results = dispatcher
        .dispatch(&NotificationRequest::new("build finished", None))
        .await;

    let names: Vec<_> = results.iter().map(|r| r.channel.as_str()).collect();
    assert_eq!(names, vec!["feishu", "sound"]);
    match &results[0].outcome {
        Outcome::Failure(ChannelError::Rejected { code, msg }) => {
            assert_eq!(*code, 19024);
            assert_eq!(msg, "Key Words Not Found");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(
        results[1].outcome,
        Outcome::Failure(ChannelError::SideEffect(_))
    ));

    let report = SummaryReport::new(&results);
    assert_eq!(report.exit_code(), 1);
    assert!(report.expected_effects().is_empty());
}

#[tokio::test]
#[serial]
async fn test_placeholder_url_needs_setup_without_network() {
    let _env = EnvGuard::clean(CONFIG_VARS);
    let config = load(&channels_config(true, PLACEHOLDER_URL, false));

    let tasks = TaskManager::new();
    let dispatcher = Dispatcher::from_config(&config.notification, &tasks);
    let results = dispatcher
        .dispatch(&NotificationRequest::new("build finished", None))
        .await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].outcome,
        Outcome::Failure(ChannelError::Configuration(_))
    ));
    assert!(SummaryReport::new(&results).needs_webhook_setup());
}

#[tokio::test]
#[serial]
async fn test_all_channels_disabled_is_noop() {
    let _env = EnvGuard::clean(CONFIG_VARS);
    let config = load(&channels_config(false, "", false));

    let tasks = TaskManager::new();
    let dispatcher = Dispatcher::from_config(&config.notification, &tasks);
    let results = dispatcher
        .dispatch(&NotificationRequest::new("build finished", None))
        .await;

    assert!(results.is_empty());
    let report = SummaryReport::new(&results);
    assert!(report.all_succeeded());
    assert_eq!(tasks.pending(), 0);
}

#[tokio::test]
async fn test_slow_channel_does_not_delay_report_order() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(
        StaticChannel::failing("first", Effect::ChatMessage, "unreachable")
            .with_delay(std::time::Duration::from_millis(150)),
    ));
    dispatcher.register(Arc::new(StaticChannel::succeeding("second", Effect::AudibleCue)));

    let results = dispatcher
        .dispatch(&NotificationRequest::new("done", None))
        .await;
    let report = SummaryReport::new(&results);

    let text = report.to_string();
    let first = text.find("first").unwrap();
    let second = text.find("second").unwrap();
    assert!(first < second);
    assert!(text.ends_with("🎯 Expect: audible cue"));
}
