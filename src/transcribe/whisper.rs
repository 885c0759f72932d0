//! Whisper-based transcription of recorded voice prompts.
//!
//! [`SpeechModel`] wraps a `whisper_rs::WhisperContext`; a fresh
//! `WhisperState` is created per inference call so the model can be shared
//! across threads without locking. [`WhisperTranscriber`] glues the model to
//! a [`MicRecorder`] to implement the push-to-talk
//! [`TranscriptionProvider`] contract.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::recorder::{MicRecorder, WHISPER_SAMPLE_RATE};
use super::{TranscriptionError, TranscriptionProvider};

/// Recordings shorter than this are rejected as containing no speech.
const MIN_SAMPLES: usize = (WHISPER_SAMPLE_RATE / 2) as usize; // 0.5 s

/// Reduce a BCP-47 tag to the primary subtag Whisper understands
/// (`"en-US"` → `"en"`).
pub(crate) fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

// ---------------------------------------------------------------------------
// SpeechModel
// ---------------------------------------------------------------------------

/// A loaded GGML speech model.
pub struct SpeechModel {
    ctx: WhisperContext,
}

// `WhisperContext` holds a raw pointer internally but the model weights are
// read-only after loading; whisper-rs itself declares the context Send+Sync.
// SAFETY: see above.
unsafe impl Send for SpeechModel {}
unsafe impl Sync for SpeechModel {}

impl SpeechModel {
    /// Load a GGML model file.
    ///
    /// # Errors
    ///
    /// - [`TranscriptionError::ModelNotFound`] — no file at `model_path`.
    /// - [`TranscriptionError::ModelInit`] — whisper-rs rejected the file.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, TranscriptionError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(TranscriptionError::ModelNotFound(
                path.display().to_string(),
            ));
        }
        let path_str = path.to_str().ok_or_else(|| {
            TranscriptionError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| TranscriptionError::ModelInit(e.to_string()))?;
        Ok(Self { ctx })
    }

    /// Run inference over 16 kHz mono samples and return the joined,
    /// trimmed transcript.
    pub fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, TranscriptionError> {
        if audio.len() < MIN_SAMPLES {
            return Err(TranscriptionError::NoSpeech);
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscriptionError::ModelInit(e.to_string()))?;

        state
            .full(params, audio)
            .map_err(|e| TranscriptionError::Recognition(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| TranscriptionError::Recognition(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| TranscriptionError::Recognition(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// WhisperTranscriber
// ---------------------------------------------------------------------------

/// Production push-to-talk transcriber: microphone in, Whisper out.
pub struct WhisperTranscriber {
    recorder: MicRecorder,
    model: Arc<SpeechModel>,
    language: Mutex<String>,
}

impl WhisperTranscriber {
    /// Load the model and open the microphone.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, TranscriptionError> {
        let model = Arc::new(SpeechModel::load(model_path)?);
        let recorder = MicRecorder::new()?;
        Ok(Self {
            recorder,
            model,
            language: Mutex::new("en".into()),
        })
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperTranscriber {
    async fn start(&self, language: &str) -> Result<(), TranscriptionError> {
        *self.language.lock().unwrap() = primary_subtag(language).to_string();
        self.recorder.begin();
        Ok(())
    }

    async fn stop(&self) -> Result<String, TranscriptionError> {
        if !self.recorder.is_active() {
            return Err(TranscriptionError::NotRecording);
        }
        let samples = self.recorder.finish();
        let language = self.language.lock().unwrap().clone();
        let model = Arc::clone(&self.model);

        // Whisper inference is CPU-heavy; keep it off the async runtime.
        tokio::task::spawn_blocking(move || model.transcribe(&samples, &language))
            .await
            .map_err(|e| TranscriptionError::Recognition(e.to_string()))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_subtag_reduces_bcp47_tags() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag("de-DE"), "de");
        assert_eq!(primary_subtag("fr"), "fr");
        assert_eq!(primary_subtag(""), "");
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = SpeechModel::load("/nonexistent/model.bin");
        assert!(matches!(
            result,
            Err(TranscriptionError::ModelNotFound(_))
        ));
    }

    #[test]
    fn error_display_mentions_the_path() {
        let e = TranscriptionError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }
}
