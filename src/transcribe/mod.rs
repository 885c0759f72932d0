//! Voice-prompt transcription boundary (local speech-to-text).
//!
//! [`TranscriptionProvider`] models a push-to-talk session: `start` begins
//! listening, `stop` ends it and yields exactly one final transcript (or an
//! error). The production implementation is [`WhisperTranscriber`]:
//! microphone capture via `cpal` feeding a sample buffer, inference via
//! `whisper-rs` on the blocking thread pool.

pub mod recorder;
pub mod whisper;

pub use recorder::MicRecorder;
pub use whisper::{SpeechModel, WhisperTranscriber};

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

/// Errors from the transcription boundary.
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    /// No microphone or the capture stream could not be started.
    #[error("speech capture is not available: {0}")]
    Unavailable(String),

    /// `stop` was called without a matching active `start`.
    #[error("no active voice recording")]
    NotRecording,

    /// The recording was too short to contain speech.
    #[error("no speech captured — hold the button longer")]
    NoSpeech,

    /// The GGML model file was not found at the given path.
    #[error("speech model not found: {0}")]
    ModelNotFound(String),

    /// whisper-rs failed to initialise a context or state.
    #[error("speech model initialisation failed: {0}")]
    ModelInit(String),

    /// The inference pass failed.
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

// ---------------------------------------------------------------------------
// TranscriptionProvider
// ---------------------------------------------------------------------------

/// Object-safe boundary for push-to-talk speech-to-text.
///
/// One session delivers exactly one final transcript: `start`, then `stop`,
/// which resolves with the text or an error. Starting a new session while
/// one is active restarts it (the buffer is cleared).
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Begin listening. `language` is a BCP-47 tag; implementations may use
    /// only the primary subtag.
    async fn start(&self, language: &str) -> Result<(), TranscriptionError>;

    /// Stop listening and return the final transcript for the session.
    async fn stop(&self) -> Result<String, TranscriptionError>;
}
