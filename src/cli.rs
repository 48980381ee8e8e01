//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged on top
//! of the JSON config file and environment variables.

use crate::config::MessageKind;
use clap::{Parser, ValueEnum};
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Message used when no task description is given.
pub const DEFAULT_MESSAGE: &str = "Task completed";

/// Notify a chat group and play a sound when a task finishes.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Description of the finished task.
    #[arg(short, long, visible_alias = "task", value_name = "TEXT")]
    pub message: Option<String>,

    /// Webhook URL; overrides configuration and enables the chat channel.
    #[arg(short, long, value_name = "URL")]
    pub webhook: Option<String>,

    /// Project name shown in the message title (detected when omitted).
    #[arg(short, long, value_name = "NAME")]
    pub project: Option<String>,

    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Message shape posted to the webhook.
    #[arg(long, value_enum, value_name = "KIND")]
    pub format: Option<FormatArg>,

    /// Disable the sound cue for this run.
    #[arg(long)]
    pub no_sound: bool,

    /// Milliseconds to wait for background sound playback before exiting.
    #[arg(long, value_name = "MS")]
    pub grace_ms: Option<u64>,
}

impl Cli {
    /// The task description, falling back to the default message.
    pub fn message(&self) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MESSAGE)
            .to_string()
    }
}

/// Command-line spelling of [`MessageKind`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Post,
    Card,
}

impl From<FormatArg> for MessageKind {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => MessageKind::Text,
            FormatArg::Post => MessageKind::Post,
            FormatArg::Card => MessageKind::Card,
        }
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut figment = Figment::new();

        if let Some(url) = &self.webhook {
            figment = figment
                .merge(Serialized::default("notification.feishu.webhook_url", url))
                .merge(Serialized::default("notification.feishu.enabled", true));
        }

        if let Some(format) = self.format {
            figment = figment.merge(Serialized::default(
                "notification.feishu.message_type",
                MessageKind::from(format),
            ));
        }

        // `--no-sound` can only switch the channel off; its absence leaves
        // the lower layers in charge.
        if self.no_sound {
            figment = figment.merge(Serialized::default("notification.sound.enabled", false));
        }

        if let Some(grace) = self.grace_ms {
            figment = figment.merge(Serialized::default("grace_period_ms", grace));
        }

        figment.data()
    }
}
