//! Text-to-speech boundary.
//!
//! [`NarrationProvider`] speaks one text and resolves when playback
//! completes (or immediately, when auto-play is disabled in configuration).
//! The production implementation is [`TtsNarrator`] over the `tts` crate.

pub mod engine;

pub use engine::TtsNarrator;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// NarrationError
// ---------------------------------------------------------------------------

/// Errors from the narration boundary.
#[derive(Debug, Clone, Error)]
pub enum NarrationError {
    /// No synthesis engine could be reached.
    #[error("text-to-speech is not available: {0}")]
    Unavailable(String),

    /// Synthesis or playback failed mid-utterance.
    #[error("Error during audio playback. ({0})")]
    Playback(String),
}

// ---------------------------------------------------------------------------
// NarrationProvider
// ---------------------------------------------------------------------------

/// Object-safe boundary for speech playback.
///
/// The narration channel is exclusive: callers must serialize access (the
/// orchestrator enforces this through its busy state).
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Speak `text` in the voice matching `language`, resolving once
    /// playback has finished.
    ///
    /// A disabled-autoplay configuration short-circuits to immediate
    /// success without producing audio.
    async fn speak(&self, text: &str, language: &str) -> Result<(), NarrationError>;
}
