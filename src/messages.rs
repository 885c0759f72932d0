//! User-facing message constants.
//!
//! Event-log and spoken-notice texts live here so wording stays consistent
//! across the orchestrator, adapters, and tests. Log entries are English
//! only; descriptions themselves are narrated in the selected language.

// ── Errors ─────────────────────────────────────────────────────────────────

pub const API_KEY_MISSING: &str = "API Key missing. Please add your OpenAI API key.";
pub const CAMERA_NOT_INITIALIZED: &str = "Camera not initialized.";
pub const BUSY: &str = "Please wait until the current description is finished.";
pub const NO_RESPONSE_TO_REPLAY: &str = "No response to replay.";
pub const AUDIO_PLAYBACK_ERROR: &str = "Error during audio playback.";
pub const SPEECH_RECOGNITION_ERROR: &str = "Error during speech recognition.";

// ── Status ─────────────────────────────────────────────────────────────────

pub const CAPTURING_IMAGE: &str = "Capturing image...";
pub const IMAGE_CAPTURED: &str = "Image captured successfully.";
pub const SENDING_IMAGE: &str = "Sending image to the description service...";
pub const RESPONSE_RECEIVED: &str = "Response received.";
pub const PLAYBACK_STARTED: &str = "Playback response started.";
pub const PLAYBACK_COMPLETED: &str = "Audio playback completed.";
pub const AUTOPLAY_DISABLED: &str =
    "Audio auto-play is disabled. Enable it in settings to hear descriptions.";
pub const RECORDING_STARTED: &str = "Recording started.";
pub const RECORDING_STOPPED: &str = "Recording stopped.";
pub const WITH_DEFAULT_PROMPT: &str = "Image will be sent with default prompt.";
pub const WITH_DEFAULT_AND_VOICE_PROMPT: &str =
    "Image will be sent with default prompt and audio prompt.";
pub const WITH_VOICE_PROMPT_ONLY: &str = "Image will be sent with audio prompt only.";

// ── Spoken notices (always narrated in en-US) ──────────────────────────────

pub const SPOKEN_ADD_API_KEY: &str = "Please add your API key.";
pub const SPOKEN_CAMERA_NOT_INITIALIZED: &str = "Camera not initialized.";
pub const SPOKEN_IMAGE_TAKEN: &str = "Image taken.";
pub const SPOKEN_IMAGE_SENT: &str = "Image sent.";
pub const SPOKEN_IMAGE_SENT_WITH_PROMPT: &str = "Image sent with audio prompt.";

/// Language tag used for the short spoken acknowledgments above.
pub const ACK_LANGUAGE: &str = "en-US";
