//! Scriptable channel and sound fakes for tests.

use crate::core::{Channel, ChannelError, Effect, NotificationRequest};
use crate::notification::sound::{Cue, Playback, SoundError, SoundLauncher};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted cue does when launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchBehavior {
    /// Starts and exits cleanly.
    Plays,
    /// Starts, then exits with a non-zero status.
    ExitsWithError,
    /// Cannot be started at all.
    FailsToStart,
}

/// A sound launcher that records every launch instead of making noise.
pub struct ScriptedLauncher {
    primary: LaunchBehavior,
    backup: LaunchBehavior,
    launches: Mutex<Vec<Cue>>,
}

impl ScriptedLauncher {
    pub fn new(primary: LaunchBehavior, backup: LaunchBehavior) -> Self {
        Self {
            primary,
            backup,
            launches: Mutex::new(Vec::new()),
        }
    }

    /// Every cue launched so far, in order.
    pub fn launches(&self) -> Vec<Cue> {
        self.launches.lock().unwrap().clone()
    }
}

impl SoundLauncher for ScriptedLauncher {
    fn launch(&self, cue: Cue) -> Result<Playback, SoundError> {
        self.launches.lock().unwrap().push(cue);
        let behavior = match cue {
            Cue::Primary => self.primary,
            Cue::Backup => self.backup,
        };
        let program = format!("scripted-{}", cue);
        match behavior {
            LaunchBehavior::Plays => Ok(Playback::finished(Ok(()))),
            LaunchBehavior::ExitsWithError => Ok(Playback::finished(Err(SoundError::Exit {
                program,
                status: "exit status: 1".to_string(),
            }))),
            LaunchBehavior::FailsToStart => Err(SoundError::Spawn {
                program,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum Script {
    Succeed,
    Fail(String),
    Panic,
}

/// A channel with a fixed outcome that counts its deliveries.
pub struct StaticChannel {
    name: String,
    effect: Effect,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticChannel {
    fn new(name: &str, effect: Effect, script: Script) -> Self {
        Self {
            name: name.to_string(),
            effect,
            script,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(name: &str, effect: Effect) -> Self {
        Self::new(name, effect, Script::Succeed)
    }

    pub fn failing(name: &str, effect: Effect, reason: &str) -> Self {
        Self::new(name, effect, Script::Fail(reason.to_string()))
    }

    pub fn panicking(name: &str, effect: Effect) -> Self {
        Self::new(name, effect, Script::Panic)
    }

    /// Sleeps for `delay` before settling.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for StaticChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn effect(&self) -> Effect {
        self.effect
    }

    async fn deliver(&self, _request: &NotificationRequest) -> Result<(), ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.script {
            Script::Succeed => Ok(()),
            Script::Fail(reason) => Err(ChannelError::Configuration(reason.clone())),
            Script::Panic => panic!("{} channel panicked", self.name),
        }
    }
}
