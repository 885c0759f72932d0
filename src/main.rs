//! Application entry point — scene-to-speech.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load the configuration snapshot from disk (defaults on first run).
//! 3. Enumerate cameras and open the configured (or first) device.
//! 4. Build the description client, the narrator, and the transcriber —
//!    each degrades to a stub when its hardware or engine is unavailable,
//!    so the application always starts.
//! 5. Spawn the session orchestrator and the gesture driver.
//! 6. Start the global input listener (capture key + replay key).
//! 7. Wait for Ctrl-C.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use scene_to_speech::{
    capture::{CameraCapture, CaptureProvider},
    config::{new_shared_config, AppPaths, FileStore, SharedConfig},
    describe::{DescriptionClient, OpenAiVisionClient},
    eventlog::EventLog,
    gesture::{parse_key, run_gesture_loop, GestureController, GestureEvent, PressListener},
    narrate::{NarrationError, NarrationProvider, TtsNarrator},
    session::{new_shared_session, SessionCommand, SessionOrchestrator},
    transcribe::{TranscriptionError, TranscriptionProvider, WhisperTranscriber},
};

/// GGML model file expected under the models directory for voice prompts.
const SPEECH_MODEL_FILE: &str = "ggml-base.bin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("scene-to-speech starting up");

    let events = EventLog::new();

    // 2. Configuration
    let config: SharedConfig = new_shared_config(Arc::new(FileStore::open_default()));

    // 3. Camera
    for (id, label) in CameraCapture::list_devices() {
        log::info!("camera: found device {id}: {label}");
    }
    let camera_id = {
        let config = config.lock().unwrap();
        config.str_at("camera.selectedCameraId")
    };
    let capture = Arc::new(CameraCapture::open(&camera_id));
    if capture.is_ready() {
        events.add("Camera initialized. Ready to capture.");
    } else {
        events.error("Camera access denied or not available.");
    }

    // 4a. Description client
    let describer: Arc<dyn DescriptionClient> =
        Arc::new(OpenAiVisionClient::new(Arc::clone(&config)));

    // 4b. Narrator — fall back to a muted narrator on hosts without a
    //     speech engine so descriptions still land in the event log.
    let narrator: Arc<dyn NarrationProvider> =
        match TtsNarrator::start(Arc::clone(&config), events.clone()) {
            Ok(narrator) => Arc::new(narrator),
            Err(e) => {
                log::warn!("narration unavailable ({e}); descriptions will be logged only");
                Arc::new(MutedNarrator {
                    events: events.clone(),
                })
            }
        };

    // 4c. Transcriber — voice prompts need both a microphone and the model
    //     file; without them, holds simply report the recording error.
    let model_path = AppPaths::new().models_dir.join(SPEECH_MODEL_FILE);
    let transcriber: Arc<dyn TranscriptionProvider> = match WhisperTranscriber::new(&model_path) {
        Ok(transcriber) => {
            log::info!("speech model loaded: {}", model_path.display());
            Arc::new(transcriber)
        }
        Err(e) => {
            log::warn!("voice prompts unavailable: {e}");
            Arc::new(DisabledTranscriber {
                reason: e.to_string(),
            })
        }
    };

    // 5. Orchestrator + gesture driver
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (gesture_tx, gesture_rx) = mpsc::channel::<GestureEvent>(16);

    let orchestrator = Arc::new(SessionOrchestrator::new(
        new_shared_session(),
        Arc::clone(&config),
        capture as Arc<dyn CaptureProvider>,
        describer,
        narrator,
        transcriber,
        events.clone(),
    ));
    tokio::spawn(Arc::clone(&orchestrator).run(command_rx));

    let (hold_threshold_ms, voice_enabled, capture_key_name, replay_key_name) = {
        let config = config.lock().unwrap();
        (
            config.int_at("input.holdThresholdMs"),
            config.bool_at("customization.isVoicePromptEnabled"),
            config.str_at("input.captureKey"),
            config.str_at("input.replayKey"),
        )
    };
    let controller = GestureController::new(
        std::time::Duration::from_millis(hold_threshold_ms.max(0) as u64),
        voice_enabled,
    );
    tokio::spawn(run_gesture_loop(
        controller,
        gesture_rx,
        command_tx.clone(),
        Arc::clone(&config),
    ));

    // 6. Global input listener
    let capture_key = parse_key(&capture_key_name).unwrap_or(rdev::Key::F9);
    let replay_key = parse_key(&replay_key_name).unwrap_or(rdev::Key::F10);
    let _listener = PressListener::start(capture_key, replay_key, gesture_tx, command_tx);
    log::info!(
        "ready: tap {capture_key_name} to capture, hold for a voice prompt, {replay_key_name} to replay"
    );

    // 7. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// MutedNarrator — fallback when no TTS engine exists on the host
// ---------------------------------------------------------------------------

struct MutedNarrator {
    events: EventLog,
}

#[async_trait]
impl NarrationProvider for MutedNarrator {
    async fn speak(&self, text: &str, _language: &str) -> Result<(), NarrationError> {
        self.events.add(format!("Narration (muted): {text}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DisabledTranscriber — fallback when the mic or model is unavailable
// ---------------------------------------------------------------------------

struct DisabledTranscriber {
    reason: String,
}

#[async_trait]
impl TranscriptionProvider for DisabledTranscriber {
    async fn start(&self, _language: &str) -> Result<(), TranscriptionError> {
        Err(TranscriptionError::Unavailable(self.reason.clone()))
    }

    async fn stop(&self) -> Result<String, TranscriptionError> {
        Err(TranscriptionError::NotRecording)
    }
}
