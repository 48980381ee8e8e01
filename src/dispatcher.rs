//! Fans a notification out to every enabled channel.

use crate::config::NotificationConfig;
use crate::core::{Channel, ChannelError, ChannelResult, NotificationRequest, Outcome};
use crate::notification::{feishu::FeishuChannel, sound::SoundChannel};
use crate::task_manager::TaskManager;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Delivers a request to all registered channels concurrently.
///
/// Each channel runs in its own task, so a slow or failing channel never
/// holds up or cancels the others. Results come back in registration order.
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Arc<dyn Channel>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the enabled channels from `config`, in declaration order.
    ///
    /// Background work started by channels (sound playback) is tracked by `tasks`.
    pub fn from_config(config: &NotificationConfig, tasks: &TaskManager) -> Self {
        let mut dispatcher = Self::new();
        if config.feishu.enabled {
            dispatcher.register(Arc::new(FeishuChannel::from_config(&config.feishu)));
        } else {
            debug!("Feishu channel disabled");
        }
        if config.sound.enabled {
            dispatcher.register(Arc::new(SoundChannel::from_config(
                &config.sound,
                tasks.clone(),
            )));
        } else {
            debug!("Sound channel disabled");
        }
        dispatcher
    }

    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        info!(channel = channel.name(), "Registering notification channel");
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Delivers `request` on every channel and waits for all of them to settle.
    ///
    /// Returns exactly one result per registered channel, in registration
    /// order. A channel that panics is reported as failed.
    pub async fn dispatch(&self, request: &NotificationRequest) -> Vec<ChannelResult> {
        let request = Arc::new(request.clone());

        let handles = self.channels.iter().map(|channel| {
            let channel = channel.clone();
            let request = request.clone();
            tokio::spawn(async move { channel.deliver(&request).await })
        });
        let settled = join_all(handles).await;

        self.channels
            .iter()
            .zip(settled)
            .map(|(channel, joined)| {
                let outcome = match joined {
                    Ok(result) => Outcome::from(result),
                    Err(e) => Outcome::Failure(ChannelError::Aborted(e.to_string())),
                };
                match &outcome {
                    Outcome::Success => info!(channel = channel.name(), "Channel delivered"),
                    Outcome::Failure(e) => {
                        warn!(channel = channel.name(), error = %e, "Channel failed")
                    }
                }
                ChannelResult {
                    channel: channel.name().to_string(),
                    effect: channel.effect(),
                    outcome,
                }
            })
            .collect()
    }
}
