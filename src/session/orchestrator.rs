//! Session orchestrator — drives the full capture → describe → speak cycle.
//!
//! [`SessionOrchestrator`] owns the shared session state and responds to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Cycle flow
//!
//! ```text
//! SessionCommand::Capture (or a voice transcript)
//!   └─▶ entry guard: reject when any of {cycle, narration, recording}
//!       is active — at most one concurrent cycle, no queueing
//!   └─▶ preconditions: credential configured, capture source ready
//!         └─▶ Capturing:      one still frame + spoken "Image taken."
//!         └─▶ PromptBuilding: configuration (+ transcript) → prompt
//!         └─▶ Requesting:     single describe POST, no retry
//!         └─▶ Narrating:      store LastResponse, speak it
//!   └─▶ finally: phase = Idle, controls re-enabled — on every path
//! ```
//!
//! Every failure is normalized to one user-facing event-log entry at the
//! point of failure; precondition failures are additionally spoken.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::capture::{CaptureError, CaptureProvider};
use crate::config::SharedConfig;
use crate::describe::{DescribeError, DescriptionClient};
use crate::eventlog::EventLog;
use crate::messages;
use crate::narrate::{NarrationError, NarrationProvider};
use crate::prompt::PromptBuilder;
use crate::transcribe::{TranscriptionError, TranscriptionProvider};

use super::phase::{CyclePhase, SharedSessionState};
use super::SessionCommand;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Why a cycle (or replay) did not complete.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A cycle, narration, or recording is already in progress. Backpressure,
    /// not a failure — the in-flight work is untouched.
    #[error("a capture cycle is already in progress")]
    Busy,

    /// No description-service credential is configured.
    #[error("description-service credential is not configured")]
    MissingCredential,

    /// No live capture source is initialized.
    #[error("no capture source is initialized")]
    SourceUninitialized,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Describe(#[from] DescribeError),

    #[error(transparent)]
    Narration(#[from] NarrationError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

// ---------------------------------------------------------------------------
// Config snapshot
// ---------------------------------------------------------------------------

/// Values read from configuration at the start of a cycle so the store is
/// never locked across an await point.
struct CycleSettings {
    api_key: String,
    language: String,
    include_default_prompt: bool,
    custom_prompt: String,
    dev_mode: bool,
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

/// Sequences capture → prompt build → remote call → narration, enforcing
/// single-flight execution.
///
/// Create with [`SessionOrchestrator::new`], then either call
/// [`run`](Self::run) inside a tokio task or invoke the individual
/// operations directly.
pub struct SessionOrchestrator {
    state: SharedSessionState,
    config: SharedConfig,
    capture: Arc<dyn CaptureProvider>,
    describer: Arc<dyn DescriptionClient>,
    narrator: Arc<dyn NarrationProvider>,
    transcriber: Arc<dyn TranscriptionProvider>,
    events: EventLog,
}

impl SessionOrchestrator {
    pub fn new(
        state: SharedSessionState,
        config: SharedConfig,
        capture: Arc<dyn CaptureProvider>,
        describer: Arc<dyn DescriptionClient>,
        narrator: Arc<dyn NarrationProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
        events: EventLog,
    ) -> Self {
        Self {
            state,
            config,
            capture,
            describer,
            narrator,
            transcriber,
            events,
        }
    }

    /// Shared session state (phase, last response, busy flags).
    pub fn state(&self) -> &SharedSessionState {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process commands until `command_rx` is closed.
    ///
    /// Cycles are spawned rather than awaited inline so that commands
    /// arriving mid-cycle are observed — and rejected — instead of queueing
    /// behind the in-flight cycle.
    pub async fn run(self: Arc<Self>, mut command_rx: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                SessionCommand::Capture => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _ = this.run_cycle(None).await;
                    });
                }
                SessionCommand::BeginVoicePrompt => {
                    self.begin_voice_prompt().await;
                }
                SessionCommand::EndVoicePrompt => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        this.end_voice_prompt().await;
                    });
                }
                SessionCommand::Replay => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        this.replay().await;
                    });
                }
            }
        }

        log::info!("session: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // The cycle
    // -----------------------------------------------------------------------

    /// Run one full cycle. `voice_prompt` is the transcript from a completed
    /// voice recording; a blank transcript degrades to default-prompt mode.
    pub async fn run_cycle(&self, voice_prompt: Option<String>) -> Result<(), SessionError> {
        let voice_prompt = voice_prompt.filter(|t| !t.trim().is_empty());

        // ── Entry guard: claim the pipeline or reject ────────────────────
        let rejected = {
            let mut st = self.state.lock().unwrap();
            if st.phase.is_busy() || st.narrating || st.transcribing {
                log::debug!("session: cycle rejected (phase {})", st.phase.label());
                true
            } else {
                st.phase = CyclePhase::Capturing;
                st.controls_enabled = false;
                false
            }
        };
        if rejected {
            self.events.error(messages::BUSY);
            return Err(SessionError::Busy);
        }

        let outcome = self.cycle_body(voice_prompt).await;

        // Finally: whatever happened above — including failures inside the
        // remote call or narration — release the pipeline and re-enable the
        // capture controls.
        {
            let mut st = self.state.lock().unwrap();
            st.phase = CyclePhase::Idle;
            st.controls_enabled = true;
        }

        outcome
    }

    async fn cycle_body(&self, voice_prompt: Option<String>) -> Result<(), SessionError> {
        let settings = self.cycle_settings();

        // ── Preconditions, in order; abort before any side effect ────────
        if settings.api_key.trim().is_empty() {
            self.events.error(messages::API_KEY_MISSING);
            self.speak_notice(messages::SPOKEN_ADD_API_KEY).await;
            return Err(SessionError::MissingCredential);
        }
        if !self.capture.is_ready() {
            self.events.error(messages::CAMERA_NOT_INITIALIZED);
            self.speak_notice(messages::SPOKEN_CAMERA_NOT_INITIALIZED).await;
            return Err(SessionError::SourceUninitialized);
        }

        // ── Capturing ────────────────────────────────────────────────────
        self.events.add(messages::CAPTURING_IMAGE);
        let image = match self.capture.capture().await {
            Ok(image) => image,
            Err(e) => {
                self.events.error(e.to_string());
                return Err(e.into());
            }
        };
        self.events.add(messages::IMAGE_CAPTURED);

        // Immediate audible feedback before any network latency.
        self.speak_ack(messages::SPOKEN_IMAGE_TAKEN).await?;

        // ── PromptBuilding ───────────────────────────────────────────────
        self.set_phase(CyclePhase::PromptBuilding);
        let prompt = PromptBuilder::new(
            &settings.language,
            settings.include_default_prompt,
            &settings.custom_prompt,
        )
        .build(voice_prompt.as_deref());

        self.events.add(match (&voice_prompt, settings.include_default_prompt) {
            (Some(_), true) => messages::WITH_DEFAULT_AND_VOICE_PROMPT,
            (Some(_), false) => messages::WITH_VOICE_PROMPT_ONLY,
            (None, _) => messages::WITH_DEFAULT_PROMPT,
        });

        let echo = format!("Final prompt: \"{prompt}\"");
        if settings.dev_mode {
            self.events.add(echo);
        } else {
            log::debug!("session: {echo}");
        }

        // ── Requesting ───────────────────────────────────────────────────
        self.set_phase(CyclePhase::Requesting);
        self.events.add(messages::SENDING_IMAGE);
        let description = match self.describer.describe(&image, &prompt).await {
            Ok(description) => description,
            Err(e) => {
                self.events.error(e.to_string());
                return Err(e.into());
            }
        };

        self.speak_ack(if voice_prompt.is_some() {
            messages::SPOKEN_IMAGE_SENT_WITH_PROMPT
        } else {
            messages::SPOKEN_IMAGE_SENT
        })
        .await?;
        self.events.add(messages::RESPONSE_RECEIVED);

        // ── Narrating ────────────────────────────────────────────────────
        self.set_phase(CyclePhase::Narrating);
        self.state.lock().unwrap().last_response = Some(description.clone());
        self.events.add(messages::PLAYBACK_STARTED);

        if let Err(e) = self.narrator.speak(&description, &settings.language).await {
            self.events.error(e.to_string());
            return Err(e.into());
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Speak the most recent description again. Subject to the same
    /// single-flight narration guard as the cycle: a replay during any
    /// active cycle or narration is rejected, not queued.
    pub async fn replay(&self) -> Result<(), SessionError> {
        enum Gate {
            Rejected,
            Nothing,
            Speak(String),
        }

        let gate = {
            let mut st = self.state.lock().unwrap();
            if st.phase.is_busy() || st.narrating {
                Gate::Rejected
            } else {
                match st.last_response.clone() {
                    None => Gate::Nothing,
                    Some(text) => {
                        st.narrating = true;
                        Gate::Speak(text)
                    }
                }
            }
        };

        match gate {
            Gate::Rejected => {
                self.events.error(messages::BUSY);
                Err(SessionError::Busy)
            }
            Gate::Nothing => {
                self.events.error(messages::NO_RESPONSE_TO_REPLAY);
                Ok(())
            }
            Gate::Speak(text) => {
                self.events.add(messages::PLAYBACK_STARTED);
                let language = {
                    let config = self.config.lock().unwrap();
                    config.str_at("customization.selectedLanguage")
                };

                let result = self.narrator.speak(&text, &language).await;
                self.state.lock().unwrap().narrating = false;

                if let Err(e) = result {
                    self.events.error(e.to_string());
                    return Err(e.into());
                }
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Voice prompts
    // -----------------------------------------------------------------------

    /// Start recording a spoken prompt (gesture hold confirmed).
    pub async fn begin_voice_prompt(&self) {
        let rejected = {
            let mut st = self.state.lock().unwrap();
            if st.phase.is_busy() || st.narrating || st.transcribing {
                true
            } else {
                st.transcribing = true;
                false
            }
        };
        if rejected {
            self.events.error(messages::BUSY);
            return;
        }

        let language = {
            let config = self.config.lock().unwrap();
            config.str_at("customization.selectedLanguage")
        };

        match self.transcriber.start(&language).await {
            Ok(()) => self.events.add(messages::RECORDING_STARTED),
            Err(e) => {
                self.state.lock().unwrap().transcribing = false;
                self.events
                    .error(format!("{} ({e})", messages::SPEECH_RECOGNITION_ERROR));
                self.speak_notice(messages::SPEECH_RECOGNITION_ERROR).await;
            }
        }
    }

    /// Stop the recording (gesture released); the final transcript drives a
    /// capture cycle.
    pub async fn end_voice_prompt(&self) {
        let was_recording = {
            let st = self.state.lock().unwrap();
            st.transcribing
        };
        if !was_recording {
            log::debug!("session: voice-prompt stop without an active recording");
            return;
        }

        let result = self.transcriber.stop().await;
        self.state.lock().unwrap().transcribing = false;

        match result {
            Ok(transcript) => {
                self.events.add(messages::RECORDING_STOPPED);
                self.events.add(format!("Audio prompt: \"{transcript}\""));
                let _ = self.run_cycle(Some(transcript)).await;
            }
            Err(e) => {
                self.events
                    .error(format!("{} ({e})", messages::SPEECH_RECOGNITION_ERROR));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn cycle_settings(&self) -> CycleSettings {
        let config = self.config.lock().unwrap();
        CycleSettings {
            api_key: config.str_at("api.apiKey"),
            language: config.str_at("customization.selectedLanguage"),
            include_default_prompt: config.bool_at("customization.includeDefaultPrompt"),
            custom_prompt: config.str_at("customization.customPrompt"),
            dev_mode: config.bool_at("devMode.isDevModeEnabled"),
        }
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.state.lock().unwrap().phase = phase;
    }

    /// Spoken acknowledgments inside a cycle: failure aborts the cycle.
    async fn speak_ack(&self, text: &str) -> Result<(), SessionError> {
        match self.narrator.speak(text, messages::ACK_LANGUAGE).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.events.error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Spoken precondition notices: best-effort, never masks the
    /// precondition failure itself.
    async fn speak_notice(&self, text: &str) {
        if let Err(e) = self.narrator.speak(text, messages::ACK_LANGUAGE).await {
            log::warn!("session: could not speak notice: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{new_shared_config, MemoryStore};
    use crate::session::phase::new_shared_session;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    struct MockCapture {
        ready: bool,
        result: Result<Vec<u8>, CaptureError>,
        calls: AtomicUsize,
    }

    impl MockCapture {
        fn ok() -> Self {
            Self {
                ready: true,
                result: Ok(vec![0xFF, 0xD8, 0xFF, 0xD9]),
                calls: AtomicUsize::new(0),
            }
        }

        fn not_ready() -> Self {
            Self {
                ready: false,
                result: Err(CaptureError::SourceUnavailable),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CaptureProvider for MockCapture {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct MockDescriber {
        result: Result<String, DescribeError>,
        last_prompt: Mutex<Option<String>>,
    }

    impl MockDescriber {
        fn ok(text: &str) -> Self {
            Self {
                result: Ok(text.into()),
                last_prompt: Mutex::new(None),
            }
        }

        fn err(error: DescribeError) -> Self {
            Self {
                result: Err(error),
                last_prompt: Mutex::new(None),
            }
        }

        fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DescriptionClient for MockDescriber {
        async fn describe(&self, _image: &[u8], prompt: &str) -> Result<String, DescribeError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.result.clone()
        }
    }

    /// Records every utterance; optionally fails from the n-th call on.
    struct MockNarrator {
        spoken: Mutex<Vec<(String, String)>>,
        fail_from: Option<usize>,
        calls: AtomicUsize,
    }

    impl MockNarrator {
        fn ok() -> Self {
            Self {
                spoken: Mutex::new(Vec::new()),
                fail_from: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn fail_from(n: usize) -> Self {
            Self {
                spoken: Mutex::new(Vec::new()),
                fail_from: Some(n),
                calls: AtomicUsize::new(0),
            }
        }

        fn spoken(&self) -> Vec<(String, String)> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NarrationProvider for MockNarrator {
        async fn speak(&self, text: &str, language: &str) -> Result<(), NarrationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_from.is_some_and(|n| call >= n) {
                return Err(NarrationError::Playback("synthetic failure".into()));
            }
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string()));
            Ok(())
        }
    }

    struct MockTranscriber {
        transcript: Result<String, TranscriptionError>,
    }

    impl MockTranscriber {
        fn ok(text: &str) -> Self {
            Self {
                transcript: Ok(text.into()),
            }
        }
    }

    #[async_trait]
    impl TranscriptionProvider for MockTranscriber {
        async fn start(&self, _language: &str) -> Result<(), TranscriptionError> {
            Ok(())
        }

        async fn stop(&self) -> Result<String, TranscriptionError> {
            self.transcript.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        orchestrator: SessionOrchestrator,
        capture: Arc<MockCapture>,
        describer: Arc<MockDescriber>,
        narrator: Arc<MockNarrator>,
        events: EventLog,
    }

    fn harness(
        capture: MockCapture,
        describer: MockDescriber,
        narrator: MockNarrator,
        with_api_key: bool,
    ) -> Harness {
        let config = new_shared_config(std::sync::Arc::new(MemoryStore::new()));
        if with_api_key {
            config.lock().unwrap().set("api.apiKey", "sk-test");
        }

        let capture = Arc::new(capture);
        let describer = Arc::new(describer);
        let narrator = Arc::new(narrator);
        let events = EventLog::new();

        let orchestrator = SessionOrchestrator::new(
            new_shared_session(),
            config,
            Arc::clone(&capture) as Arc<dyn CaptureProvider>,
            Arc::clone(&describer) as Arc<dyn DescriptionClient>,
            Arc::clone(&narrator) as Arc<dyn NarrationProvider>,
            Arc::new(MockTranscriber::ok("unused")),
            events.clone(),
        );

        Harness {
            orchestrator,
            capture,
            describer,
            narrator,
            events,
        }
    }

    // -----------------------------------------------------------------------
    // Cycle tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn happy_path_stores_and_narrates_description() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("a red door on your left"),
            MockNarrator::ok(),
            true,
        );

        h.orchestrator.run_cycle(None).await.unwrap();

        let st = h.orchestrator.state().lock().unwrap();
        assert_eq!(st.phase, CyclePhase::Idle);
        assert!(st.controls_enabled);
        assert_eq!(st.last_response.as_deref(), Some("a red door on your left"));
        drop(st);

        // Acks in en-US, description in the selected language.
        let spoken = h.narrator.spoken();
        assert_eq!(spoken[0], ("Image taken.".into(), "en-US".into()));
        assert_eq!(spoken[1], ("Image sent.".into(), "en-US".into()));
        assert_eq!(
            spoken[2],
            ("a red door on your left".into(), "en-US".into())
        );
        assert!(h.events.contains(messages::RESPONSE_RECEIVED));
    }

    #[tokio::test]
    async fn missing_credential_aborts_before_capture() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            false,
        );

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredential));
        assert_eq!(h.capture.calls(), 0, "no side effects before preconditions");
        assert!(h.events.contains(messages::API_KEY_MISSING));

        // The notice was spoken and the controls are back.
        assert_eq!(h.narrator.spoken()[0].0, messages::SPOKEN_ADD_API_KEY);
        let st = h.orchestrator.state().lock().unwrap();
        assert_eq!(st.phase, CyclePhase::Idle);
        assert!(st.controls_enabled);
    }

    #[tokio::test]
    async fn uninitialized_source_aborts_with_spoken_notice() {
        let h = harness(
            MockCapture::not_ready(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::SourceUninitialized));
        assert_eq!(h.capture.calls(), 0);
        assert!(h.events.contains(messages::CAMERA_NOT_INITIALIZED));
    }

    #[tokio::test]
    async fn busy_cycle_is_rejected_and_preserves_last_response() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("new description"),
            MockNarrator::ok(),
            true,
        );

        {
            let mut st = h.orchestrator.state().lock().unwrap();
            st.phase = CyclePhase::Requesting;
            st.last_response = Some("previous description".into());
        }

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert!(h.events.contains(messages::BUSY));

        let st = h.orchestrator.state().lock().unwrap();
        // The rejection must not touch the in-flight cycle's state.
        assert_eq!(st.phase, CyclePhase::Requesting);
        assert_eq!(st.last_response.as_deref(), Some("previous description"));
    }

    #[tokio::test]
    async fn remote_error_leaves_last_response_and_reenables_controls() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::err(DescribeError::Remote("quota exhausted".into())),
            MockNarrator::ok(),
            true,
        );
        h.orchestrator.state().lock().unwrap().last_response = Some("previous".into());

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Describe(_)));
        assert!(h.events.contains("quota exhausted"));

        let st = h.orchestrator.state().lock().unwrap();
        assert_eq!(st.phase, CyclePhase::Idle);
        assert!(st.controls_enabled);
        assert_eq!(st.last_response.as_deref(), Some("previous"));
    }

    #[tokio::test]
    async fn capture_failure_aborts_and_resets() {
        let h = harness(
            MockCapture {
                ready: true,
                result: Err(CaptureError::Device("ioctl failed".into())),
                calls: AtomicUsize::new(0),
            },
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Capture(_)));
        assert!(h.events.contains("ioctl failed"));
        assert!(h.orchestrator.state().lock().unwrap().controls_enabled);
    }

    #[tokio::test]
    async fn narration_failure_still_resets_and_keeps_response() {
        // Calls 0 and 1 are the acks; call 2 (the description) fails.
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("described scene"),
            MockNarrator::fail_from(2),
            true,
        );

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Narration(_)));

        let st = h.orchestrator.state().lock().unwrap();
        assert_eq!(st.phase, CyclePhase::Idle);
        assert!(st.controls_enabled);
        // The description had been received; it stays replayable.
        assert_eq!(st.last_response.as_deref(), Some("described scene"));
    }

    #[tokio::test]
    async fn voice_transcript_is_merged_into_the_prompt() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("ok"),
            MockNarrator::ok(),
            true,
        );

        h.orchestrator
            .run_cycle(Some("is there a dog".into()))
            .await
            .unwrap();

        let prompt = h.describer.last_prompt().unwrap();
        assert!(prompt.starts_with(crate::prompt::default_prompt("en-US")));
        assert!(prompt.ends_with("is there a dog"));
        assert!(h.events.contains(messages::WITH_DEFAULT_AND_VOICE_PROMPT));

        // The post-request ack mentions the audio prompt.
        let spoken = h.narrator.spoken();
        assert!(spoken
            .iter()
            .any(|(text, _)| text == messages::SPOKEN_IMAGE_SENT_WITH_PROMPT));
    }

    #[tokio::test]
    async fn blank_transcript_degrades_to_default_mode() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("ok"),
            MockNarrator::ok(),
            true,
        );

        h.orchestrator.run_cycle(Some("   ".into())).await.unwrap();

        assert_eq!(
            h.describer.last_prompt().unwrap(),
            crate::prompt::default_prompt("en-US")
        );
        assert!(h.events.contains(messages::WITH_DEFAULT_PROMPT));
    }

    // -----------------------------------------------------------------------
    // Replay tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn replay_without_response_logs_and_stays_silent() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );

        h.orchestrator.replay().await.unwrap();
        assert!(h.events.contains(messages::NO_RESPONSE_TO_REPLAY));
        assert!(h.narrator.spoken().is_empty());
    }

    #[tokio::test]
    async fn replay_speaks_last_response_in_selected_language() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );
        h.orchestrator
            .state()
            .lock()
            .unwrap()
            .last_response = Some("une porte rouge".into());

        {
            let config = h.orchestrator.config.clone();
            config
                .lock()
                .unwrap()
                .set("customization.selectedLanguage", "fr-FR");
        }

        h.orchestrator.replay().await.unwrap();
        assert_eq!(
            h.narrator.spoken(),
            vec![("une porte rouge".to_string(), "fr-FR".to_string())]
        );
        assert!(!h.orchestrator.state().lock().unwrap().narrating);
    }

    #[tokio::test]
    async fn replay_is_rejected_while_narration_is_active() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );
        {
            let mut st = h.orchestrator.state().lock().unwrap();
            st.last_response = Some("text".into());
            st.narrating = true;
        }

        let err = h.orchestrator.replay().await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert!(h.narrator.spoken().is_empty());
    }

    #[tokio::test]
    async fn cycle_is_rejected_while_replay_narration_is_active() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );
        h.orchestrator.state().lock().unwrap().narrating = true;

        let err = h.orchestrator.run_cycle(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert_eq!(h.capture.calls(), 0);
    }

    // -----------------------------------------------------------------------
    // Voice-prompt session tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn voice_prompt_round_trip_runs_a_cycle_with_the_transcript() {
        let config = new_shared_config(std::sync::Arc::new(MemoryStore::new()));
        config.lock().unwrap().set("api.apiKey", "sk-test");
        config
            .lock()
            .unwrap()
            .set("customization.includeDefaultPrompt", false);

        let describer = Arc::new(MockDescriber::ok("seen"));
        let narrator = Arc::new(MockNarrator::ok());
        let events = EventLog::new();

        let orchestrator = SessionOrchestrator::new(
            new_shared_session(),
            config,
            Arc::new(MockCapture::ok()),
            Arc::clone(&describer) as Arc<dyn DescriptionClient>,
            Arc::clone(&narrator) as Arc<dyn NarrationProvider>,
            Arc::new(MockTranscriber::ok("what is in front of me")),
            events.clone(),
        );

        orchestrator.begin_voice_prompt().await;
        assert!(orchestrator.state().lock().unwrap().transcribing);
        assert!(events.contains(messages::RECORDING_STARTED));

        orchestrator.end_voice_prompt().await;
        assert!(!orchestrator.state().lock().unwrap().transcribing);
        assert!(events.contains(messages::RECORDING_STOPPED));
        assert!(events.contains("what is in front of me"));

        // include_default_prompt=false → the transcript goes verbatim.
        assert_eq!(
            describer.last_prompt().as_deref(),
            Some("what is in front of me")
        );
    }

    #[tokio::test]
    async fn begin_voice_prompt_is_rejected_while_busy() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );
        h.orchestrator.state().lock().unwrap().phase = CyclePhase::Requesting;

        h.orchestrator.begin_voice_prompt().await;
        assert!(!h.orchestrator.state().lock().unwrap().transcribing);
        assert!(h.events.contains(messages::BUSY));
    }

    #[tokio::test]
    async fn end_voice_prompt_without_recording_is_a_no_op() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("unused"),
            MockNarrator::ok(),
            true,
        );
        h.orchestrator.end_voice_prompt().await;
        assert_eq!(h.capture.calls(), 0);
        assert!(h.narrator.spoken().is_empty());
    }

    // -----------------------------------------------------------------------
    // Run-loop test
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_loop_processes_capture_commands() {
        let h = harness(
            MockCapture::ok(),
            MockDescriber::ok("loop description"),
            MockNarrator::ok(),
            true,
        );
        let state = Arc::clone(h.orchestrator.state());
        let orchestrator = Arc::new(h.orchestrator);

        let (tx, rx) = mpsc::channel(4);
        let runner = tokio::spawn(Arc::clone(&orchestrator).run(rx));

        tx.send(SessionCommand::Capture).await.unwrap();
        drop(tx);
        runner.await.unwrap();

        // The spawned cycle may still be finishing; wait for it.
        for _ in 0..50 {
            if state.lock().unwrap().last_response.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(
            state.lock().unwrap().last_response.as_deref(),
            Some("loop description")
        );
    }
}
