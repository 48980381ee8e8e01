//! A channel that plays a local sound cue through an OS process.
//!
//! Delivery succeeds once the cue has been *launched*. Whether it was
//! actually audible is only known later, when the process exits; that wait
//! happens in a background task tracked by a [`TaskManager`], which also
//! launches the backup beep if the primary cue exits with an error.

use crate::config::SoundConfig;
use crate::core::{Channel, ChannelError, Effect, NotificationRequest};
use crate::task_manager::TaskManager;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Why a sound cue could not be played.
#[derive(Debug, Error)]
pub enum SoundError {
    #[error("no command configured for the {0} cue")]
    NoCommand(Cue),
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: String },
    #[error("{primary}; backup beep also failed: {backup}")]
    BackupFailed {
        primary: Box<SoundError>,
        backup: Box<SoundError>,
    },
}

/// Which of the two sounds to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// The spoken announcement.
    Primary,
    /// The plain beep used when the announcement fails.
    Backup,
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cue::Primary => write!(f, "primary"),
            Cue::Backup => write!(f, "backup"),
        }
    }
}

/// A cue that has been launched; resolves when playback ends.
pub struct Playback {
    completion: BoxFuture<'static, Result<(), SoundError>>,
}

impl Playback {
    pub fn new<F>(completion: F) -> Self
    where
        F: Future<Output = Result<(), SoundError>> + Send + 'static,
    {
        Self {
            completion: completion.boxed(),
        }
    }

    /// A playback that has already ended with `result`.
    pub fn finished(result: Result<(), SoundError>) -> Self {
        Self::new(futures::future::ready(result))
    }

    /// Waits for the playback process to exit.
    pub async fn wait(self) -> Result<(), SoundError> {
        self.completion.await
    }
}

/// Starts sound playback.
pub trait SoundLauncher: Send + Sync {
    /// Launches `cue` and returns as soon as it is running.
    fn launch(&self, cue: Cue) -> Result<Playback, SoundError>;
}

/// Plays cues by spawning OS commands.
#[derive(Debug, Clone)]
pub struct SystemSound {
    primary: Vec<String>,
    backup: Vec<String>,
}

impl SystemSound {
    pub fn new(primary: Vec<String>, backup: Vec<String>) -> Self {
        Self { primary, backup }
    }

    /// Uses the configured commands, or the platform defaults where none are set.
    pub fn from_config(config: &SoundConfig) -> Self {
        Self {
            primary: config
                .command
                .clone()
                .unwrap_or_else(|| default_speech_command(&config.speech)),
            backup: config
                .backup_command
                .clone()
                .unwrap_or_else(default_beep_command),
        }
    }

    fn command_for(&self, cue: Cue) -> &[String] {
        match cue {
            Cue::Primary => &self.primary,
            Cue::Backup => &self.backup,
        }
    }
}

impl SoundLauncher for SystemSound {
    fn launch(&self, cue: Cue) -> Result<Playback, SoundError> {
        let (program, args) = self
            .command_for(cue)
            .split_first()
            .ok_or(SoundError::NoCommand(cue))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SoundError::Spawn {
                program: program.clone(),
                source,
            })?;

        let program = program.clone();
        Ok(Playback::new(async move {
            let status = child.wait().await.map_err(|source| SoundError::Spawn {
                program: program.clone(),
                source,
            })?;
            if status.success() {
                Ok(())
            } else {
                Err(SoundError::Exit {
                    program,
                    status: status.to_string(),
                })
            }
        }))
    }
}

/// The platform's text-to-speech command.
pub fn default_speech_command(speech: &str) -> Vec<String> {
    if cfg!(target_os = "windows") {
        let speech = speech.replace('"', "'");
        vec![
            "powershell".to_string(),
            "-Command".to_string(),
            format!(
                "Add-Type -AssemblyName System.Speech; \
                 (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak(\"{}\"); \
                 [console]::Beep(800, 300)",
                speech
            ),
        ]
    } else if cfg!(target_os = "macos") {
        vec!["say".to_string(), speech.to_string()]
    } else {
        vec![
            "spd-say".to_string(),
            "--wait".to_string(),
            speech.to_string(),
        ]
    }
}

/// The platform's plain beep command.
pub fn default_beep_command() -> Vec<String> {
    let parts: &[&str] = if cfg!(target_os = "windows") {
        &["powershell", "-Command", "[console]::Beep(800, 500)"]
    } else if cfg!(target_os = "macos") {
        &["osascript", "-e", "beep"]
    } else {
        &["paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"]
    };
    parts.iter().map(|s| s.to_string()).collect()
}

/// Plays the configured cue, falling back to a beep when allowed.
pub struct SoundChannel {
    launcher: Arc<dyn SoundLauncher>,
    backup: bool,
    tasks: TaskManager,
}

impl SoundChannel {
    pub fn new(launcher: Arc<dyn SoundLauncher>, backup: bool, tasks: TaskManager) -> Self {
        Self {
            launcher,
            backup,
            tasks,
        }
    }

    pub fn from_config(config: &SoundConfig, tasks: TaskManager) -> Self {
        Self::new(
            Arc::new(SystemSound::from_config(config)),
            config.backup,
            tasks,
        )
    }

    /// Keeps watching a launched cue in the background.
    fn watch(&self, cue: Cue, playback: Playback) {
        let launcher = self.launcher.clone();
        let backup = self.backup && cue == Cue::Primary;
        self.tasks.spawn("sound-playback", async move {
            match playback.wait().await {
                Ok(()) => info!(%cue, "Sound cue played."),
                Err(e) if backup => {
                    warn!(error = %e, "Sound cue failed, playing backup beep");
                    play_to_end(launcher.as_ref(), Cue::Backup).await;
                }
                Err(e) => warn!(%cue, error = %e, "Sound cue failed"),
            }
        });
    }
}

async fn play_to_end(launcher: &dyn SoundLauncher, cue: Cue) {
    let result = match launcher.launch(cue) {
        Ok(playback) => playback.wait().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(%cue, error = %e, "Sound cue failed");
    }
}

#[async_trait]
impl Channel for SoundChannel {
    fn name(&self) -> &str {
        "sound"
    }

    fn effect(&self) -> Effect {
        Effect::AudibleCue
    }

    #[instrument(skip_all, fields(backup = self.backup))]
    async fn deliver(&self, _request: &NotificationRequest) -> Result<(), ChannelError> {
        match self.launcher.launch(Cue::Primary) {
            Ok(playback) => {
                info!("Sound cue launched.");
                self.watch(Cue::Primary, playback);
                Ok(())
            }
            Err(e) if self.backup => {
                warn!(error = %e, "Could not start sound cue, trying backup beep");
                let playback = self.launcher.launch(Cue::Backup).map_err(|backup| {
                    SoundError::BackupFailed {
                        primary: Box::new(e),
                        backup: Box::new(backup),
                    }
                })?;
                self.watch(Cue::Backup, playback);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
