//! Core domain types and the channel trait for task-notify
//!
//! This module defines the data that flows through a dispatch (the request,
//! the per-channel result) and the trait contract every notification
//! channel implements.

use crate::notification::sound::SoundError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fmt;
use thiserror::Error;

/// Placeholder fragment shipped in sample configurations. A webhook URL
/// containing it has never been filled in.
pub const WEBHOOK_PLACEHOLDER: &str = "YOUR_WEBHOOK_URL_HERE";

/// A single "task finished" notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    /// Description of the finished task
    pub message: String,
    /// Name of the project the task belongs to, if known
    pub project_name: Option<String>,
    /// Local time the request was created
    pub timestamp: DateTime<Local>,
}

impl NotificationRequest {
    /// Creates a request stamped with the current local time.
    pub fn new(message: impl Into<String>, project_name: Option<String>) -> Self {
        Self {
            message: message.into(),
            project_name: project_name.filter(|name| !name.trim().is_empty()),
            timestamp: Local::now(),
        }
    }

    /// The headline shown by the chat client. The project name goes first so
    /// it survives truncation on small screens.
    pub fn title(&self) -> String {
        match &self.project_name {
            Some(project) => format!("{}: {}", project, self.message),
            None => self.message.clone(),
        }
    }

    /// The message body below the title.
    pub fn body(&self) -> String {
        format!(
            "⏰ Completed at: {}\n\n💡 The results are ready for review.",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// The physical effect a channel produces when it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// A message lands in a chat group (and on paired phones and wearables)
    ChatMessage,
    /// The local machine speaks or beeps
    AudibleCue,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::ChatMessage => write!(f, "chat message"),
            Effect::AudibleCue => write!(f, "audible cue"),
        }
    }
}

/// Why a channel failed to deliver.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel is enabled but cannot be used as configured.
    #[error("not configured: {0}")]
    Configuration(String),
    /// The HTTP request could not be completed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The webhook answered with a non-2xx HTTP status.
    #[error("webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The webhook answered with a non-zero `code`.
    #[error("rejected by webhook (code {code}): {msg}")]
    Rejected { code: i64, msg: String },
    /// The webhook answered with something other than the expected JSON envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The outgoing payload could not be serialized.
    #[error("could not encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    /// The sound process could not be started.
    #[error("sound playback failed: {0}")]
    SideEffect(#[from] SoundError),
    /// The delivery task itself died.
    #[error("channel task aborted: {0}")]
    Aborted(String),
}

/// The settled state of one channel after a dispatch.
#[derive(Debug)]
pub enum Outcome {
    Success,
    Failure(ChannelError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<Result<(), ChannelError>> for Outcome {
    fn from(result: Result<(), ChannelError>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// One channel's result for one dispatch.
#[derive(Debug)]
pub struct ChannelResult {
    /// Name of the channel that produced this result
    pub channel: String,
    /// What the user experiences if the channel succeeded
    pub effect: Effect,
    pub outcome: Outcome,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers notifications to one destination.
#[async_trait]
pub trait Channel: Send + Sync {
    /// A unique, descriptive name for the channel (e.g., "feishu", "sound").
    /// Used for logging and the summary report.
    fn name(&self) -> &str;

    /// The effect a successful delivery has on the user.
    fn effect(&self) -> Effect;

    /// Delivers a notification.
    ///
    /// # Returns
    /// * `Ok(())` once the notification was accepted (or, for side effects,
    ///   launched)
    /// * `Err` describing why delivery failed; implementations never panic on
    ///   I/O errors
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), ChannelError>;
}
