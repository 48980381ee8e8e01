//! Configuration management for task-notify
//!
//! This module defines the main `Config` struct and its per-channel
//! sub-structs. It uses the `figment` crate to layer, from lowest to highest
//! precedence: built-in defaults, a JSON config file, environment variables
//! and finally command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized},
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "notify.json";

/// Prefix for structured overrides, e.g. `TASK_NOTIFY_NOTIFICATION__SOUND__BACKUP=false`.
pub const ENV_PREFIX: &str = "TASK_NOTIFY_";

/// Webhook URL variable understood by older setups.
pub const WEBHOOK_URL_VAR: &str = "FEISHU_WEBHOOK_URL";

/// Boolean switch for the sound channel understood by older setups.
pub const SOUND_ENABLED_VAR: &str = "SOUND_ENABLED";

/// Card template used when none is configured.
pub const DEFAULT_TEMPLATE_ID: &str = "AAqKGP7Qx6y9R";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The logging level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// How long to wait for background side effects (sound) before exiting.
    pub grace_period_ms: u64,
    /// Per-channel notification settings.
    pub notification: NotificationConfig,
}

/// Settings for every notification channel, in dispatch order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct NotificationConfig {
    /// Feishu (Lark) custom bot webhook.
    pub feishu: FeishuConfig,
    /// Local sound cue.
    pub sound: SoundConfig,
}

/// The message shape posted to the webhook.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text message.
    Text,
    /// Rich text with a title.
    #[default]
    Post,
    /// Templated interactive card.
    #[serde(alias = "interactive")]
    Card,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Post => write!(f, "post"),
            MessageKind::Card => write!(f, "card"),
        }
    }
}

/// Configuration for the Feishu webhook channel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeishuConfig {
    pub enabled: bool,
    /// The custom bot webhook URL.
    pub webhook_url: String,
    pub message_type: MessageKind,
    /// Template used for `card` messages.
    pub template_id: String,
    /// Request timeout for the webhook POST.
    pub timeout_seconds: u64,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            message_type: MessageKind::Post,
            template_id: DEFAULT_TEMPLATE_ID.to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Configuration for the local sound channel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Play a plain beep if the primary cue cannot be played.
    pub backup: bool,
    /// Phrase spoken by the default speech command.
    pub speech: String,
    /// Overrides the platform speech command (program followed by arguments).
    pub command: Option<Vec<String>>,
    /// Overrides the platform beep command (program followed by arguments).
    pub backup_command: Option<Vec<String>>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backup: true,
            speech: "Task complete, phone notification sent".to_string(),
            command: None,
            backup_command: None,
        }
    }
}

impl Config {
    /// Loads the configuration from every layer, including the config file.
    ///
    /// Fails if the config file exists but cannot be parsed; callers recover
    /// with [`Config::load_without_file`].
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = Self::file_path(cli);
        Ok(Self::figment(Some(&path), cli).extract()?)
    }

    /// Loads defaults, environment and command line, skipping the config file.
    pub fn load_without_file(cli: &Cli) -> Result<Self> {
        Ok(Self::figment(None, cli).extract()?)
    }

    /// Loads defaults and command line only, for when the environment itself
    /// holds an unusable value.
    pub fn load_defaults(cli: &Cli) -> Result<Self> {
        Ok(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(cli.clone())
            .extract()?)
    }

    /// The config file this invocation reads.
    pub fn file_path(cli: &Cli) -> PathBuf {
        cli.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    fn figment(file: Option<&Path>, cli: &Cli) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Json::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(LegacyEnv)
            .merge(cli.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            grace_period_ms: 3000,
            notification: NotificationConfig::default(),
        }
    }
}

/// The short environment variables older setups rely on.
///
/// A webhook URL in the environment switches the Feishu channel on, the same
/// as passing `--webhook`.
pub struct LegacyEnv;

impl Provider for LegacyEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named("Legacy Environment Variables")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut figment = Figment::new();

        if let Ok(url) = std::env::var(WEBHOOK_URL_VAR) {
            let url = url.trim().to_string();
            if !url.is_empty() {
                figment = figment
                    .merge(Serialized::default("notification.feishu.webhook_url", url))
                    .merge(Serialized::default("notification.feishu.enabled", true));
            }
        }

        if let Ok(raw) = std::env::var(SOUND_ENABLED_VAR) {
            figment = figment.merge(Serialized::default(
                "notification.sound.enabled",
                parse_flag(&raw),
            ));
        }

        figment.data()
    }
}

/// Interprets the usual spellings of a boolean environment flag.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
