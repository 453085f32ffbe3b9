use std::{
    env,
    fmt::Debug,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    process::Command,
    sync::{Notify, watch},
};
use tracing::{debug, warn};

use crate::{config::VoiceConfig, error::ChannelError};

/// One recognition alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("no speech was recognized")]
    NoSpeech,

    #[error("recognizer exited with {0}")]
    Failed(String),

    #[error("failed to run recognizer: {0}")]
    Io(#[from] std::io::Error),
}

/// Platform speech-to-text capability.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + Debug {
    /// Listen for one utterance and return its alternatives.
    async fn recognize(&self) -> Result<Vec<Transcript>, RecognitionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Recognized,
}

/// Dictation channel. Availability is fixed when the adapter is built.
#[derive(Debug)]
pub struct VoiceAdapter {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    state: watch::Sender<VoiceState>,
    stop: Notify,
}

impl VoiceAdapter {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        let (state, _) = watch::channel(VoiceState::Idle);
        Self {
            recognizer,
            state,
            stop: Notify::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> VoiceState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceState> {
        self.state.subscribe()
    }

    /// Listen once. `Ok(Some(text))` means a transcript is ready to be resolved;
    /// `Ok(None)` means the attempt ended in an error or was stopped.
    pub async fn listen(&self) -> Result<Option<String>, ChannelError> {
        let Some(recognizer) = &self.recognizer else {
            return Err(ChannelError::VoiceUnavailable);
        };

        let stopped = self.stop.notified();
        tokio::pin!(stopped);
        stopped.as_mut().enable();
        self.state.send_replace(VoiceState::Listening);

        let outcome = tokio::select! {
            result = recognizer.recognize() => Some(result),
            _ = &mut stopped => None,
        };

        match outcome {
            None => {
                debug!("voice input stopped");
                self.state.send_replace(VoiceState::Idle);
                Ok(None)
            }
            Some(Err(err)) => {
                warn!(error = %err, "speech recognition error");
                self.state.send_replace(VoiceState::Idle);
                Ok(None)
            }
            Some(Ok(alternatives)) => match best_transcript(&alternatives) {
                Some(text) => {
                    self.state.send_replace(VoiceState::Recognized);
                    Ok(Some(text))
                }
                None => {
                    debug!("recognizer returned no alternatives");
                    self.state.send_replace(VoiceState::Idle);
                    Ok(None)
                }
            },
        }
    }

    /// Abort an in-progress `listen`. No effect when idle.
    pub fn stop(&self) {
        if self.state() == VoiceState::Listening {
            self.stop.notify_waiters();
        }
        self.state.send_replace(VoiceState::Idle);
    }
}

/// Highest confidence wins; the earliest alternative wins ties.
pub fn best_transcript(alternatives: &[Transcript]) -> Option<String> {
    alternatives
        .iter()
        .fold(None::<&Transcript>, |best, candidate| match best {
            Some(b) if b.confidence >= candidate.confidence => Some(b),
            _ => Some(candidate),
        })
        .map(|t| t.text.clone())
}

/// Runs an external dictation program and reads alternatives from its stdout,
/// one per line, optionally as `text<TAB>confidence`.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Probe for the configured command. `None` when unset or not found.
    pub fn probe(config: &VoiceConfig) -> Option<Self> {
        let command = config.command.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let program = find_program(command)?;
        debug!(program = %program.display(), "voice capability available");
        Some(Self {
            program,
            args: config.args.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&self) -> Result<Vec<Transcript>, RecognitionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(RecognitionError::Failed(output.status.to_string()));
        }

        let alternatives = parse_alternatives(&String::from_utf8_lossy(&output.stdout));
        if alternatives.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }
        Ok(alternatives)
    }
}

fn parse_alternatives(stdout: &str) -> Vec<Transcript> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.rsplit_once('\t') {
            Some((text, confidence)) => Transcript {
                text: text.trim().to_string(),
                confidence: confidence.trim().parse().unwrap_or(1.0),
            },
            None => Transcript {
                text: line.trim().to_string(),
                confidence: 1.0,
            },
        })
        .collect()
}

fn find_program(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|full| full.is_file())
}
