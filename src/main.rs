//! task-notify - Task Completion Notifier
//!
//! Sends a chat message and plays a sound cue when a long-running task
//! finishes, then prints what was delivered.

use anyhow::{Context, Result};
use clap::Parser;
use std::{process::ExitCode, time::Duration};
use task_notify::{
    cli::Cli,
    config::Config,
    dispatcher::Dispatcher,
    project::detect_project_name,
    report::{SummaryReport, WEBHOOK_SETUP_GUIDE},
    task_manager::TaskManager,
    NotificationRequest,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // Layer defaults, file, environment and CLI args. A broken layer is not
    // fatal: whatever remains still describes a usable setup.
    let (config, file_error, env_error) = match Config::load(&cli) {
        Ok(config) => (config, None, None),
        Err(file_err) => match Config::load_without_file(&cli) {
            Ok(config) => (config, Some(file_err), None),
            Err(env_err) => (
                Config::load_defaults(&cli).context("Failed to build default configuration")?,
                Some(file_err),
                Some(env_err),
            ),
        },
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(err) = env_error {
        println!("⚠️  Invalid configuration in the environment, using defaults");
        warn!(error = %err, "Ignoring environment configuration");
    } else if let Some(err) = file_error {
        println!("⚠️  Could not load the config file, using environment configuration");
        warn!(
            path = %Config::file_path(&cli).display(),
            error = %err,
            "Ignoring unreadable config file"
        );
    }
    debug!(?config, "Configuration loaded");

    let project = match cli.project.clone() {
        Some(project) => project,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            detect_project_name(&cwd).await
        }
    };
    let request = NotificationRequest::new(cli.message(), Some(project));

    let tasks = TaskManager::new();
    let dispatcher = Dispatcher::from_config(&config.notification, &tasks);

    println!(
        "🚀 Sending task completion notification... [{}]",
        dispatcher.channel_names().join(", ")
    );
    if let Some(project) = &request.project_name {
        println!("📁 Project: {}", project);
    }
    println!("📝 Task: {}", request.message);

    let results = dispatcher.dispatch(&request).await;
    let report = SummaryReport::new(&results);

    println!("{}", report);
    if report.needs_webhook_setup() {
        println!("{}", WEBHOOK_SETUP_GUIDE);
    }

    // Give launched side effects a moment to become audible before exiting.
    let grace = Duration::from_millis(config.grace_period_ms);
    if !tasks.shutdown(grace).await {
        debug!("Exiting with background playback still running");
    }

    info!(exit_code = report.exit_code(), "Notification run complete");
    println!("✨ Done");
    Ok(ExitCode::from(report.exit_code()))
}
