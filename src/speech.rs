//! Speech output
//!
//! Speaking a word can take seconds, so every request runs on its own detached
//! thread. Callers only learn that the request was accepted; failures are
//! logged and never reach the frame loop.

use std::process::Command;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::GestureError;

/// A text-to-speech backend. Calls may block until playback ends.
pub trait SpeechService: Send + Sync + 'static {
    fn speak(&self, text: &str) -> Result<(), GestureError>;
}

/// Speech backend that only logs the text
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeech;

impl SpeechService for LogSpeech {
    fn speak(&self, text: &str) -> Result<(), GestureError> {
        info!(text, "speak");
        Ok(())
    }
}

/// Speech backend that runs an external synthesizer with the text as last argument
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl Default for CommandSpeech {
    fn default() -> Self {
        Self::new("espeak", Vec::new())
    }
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SpeechService for CommandSpeech {
    fn speak(&self, text: &str) -> Result<(), GestureError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .map_err(|e| GestureError::Speech(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(GestureError::Speech(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// Fire-and-forget front end for a [`SpeechService`]
#[derive(Clone)]
pub struct SpeechDispatcher {
    service: Arc<dyn SpeechService>,
}

impl Default for SpeechDispatcher {
    fn default() -> Self {
        Self::new(LogSpeech)
    }
}

impl std::fmt::Debug for SpeechDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechDispatcher").finish_non_exhaustive()
    }
}

impl SpeechDispatcher {
    pub fn new(service: impl SpeechService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn from_arc(service: Arc<dyn SpeechService>) -> Self {
        Self { service }
    }

    /// Hand `text` to the speech service without waiting for playback.
    ///
    /// Returns the id used to correlate log lines for this request.
    pub fn speak(&self, text: &str) -> Uuid {
        let request_id = Uuid::new_v4();
        let service = Arc::clone(&self.service);
        let text = text.to_string();

        debug!(%request_id, text = %text, "dispatching speech");

        let spawned = thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                if let Err(e) = service.speak(&text) {
                    warn!(%request_id, error = %e, "speech request failed");
                }
            });

        if let Err(e) = spawned {
            warn!(%request_id, error = %e, "could not start speech thread");
        }

        request_id
    }
}
