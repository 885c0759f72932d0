//! Narrator backed by the `tts` crate.
//!
//! Platform TTS handles are not generally `Send`, so [`TtsNarrator`] keeps
//! the engine on a dedicated worker thread and forwards speak requests over
//! a command channel; each request carries a oneshot reply that resolves
//! when playback has finished. The worker polls `is_speaking` to detect
//! completion — the `tts` callback API is not uniformly available across
//! backends.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tts::Tts;

use crate::config::SharedConfig;
use crate::eventlog::EventLog;
use crate::messages;

use super::{NarrationError, NarrationProvider};

/// Grace period after `speak` before completion polling starts; gives the
/// backend time to actually begin the utterance.
const SYNTHESIS_GRACE: Duration = Duration::from_millis(150);

/// Poll interval while waiting for the utterance to finish.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Worker commands
// ---------------------------------------------------------------------------

enum NarrateCommand {
    Speak {
        text: String,
        language: String,
        reply: oneshot::Sender<Result<(), NarrationError>>,
    },
}

// ---------------------------------------------------------------------------
// TtsNarrator
// ---------------------------------------------------------------------------

/// Handle to the narrator worker thread.
pub struct TtsNarrator {
    cmd_tx: mpsc::Sender<NarrateCommand>,
    config: SharedConfig,
    events: EventLog,
}

impl TtsNarrator {
    /// Spawn the worker and initialise the platform TTS engine on it.
    ///
    /// Fails with [`NarrationError::Unavailable`] when no engine exists on
    /// this system (headless hosts, missing speech service).
    pub fn start(config: SharedConfig, events: EventLog) -> Result<Self, NarrationError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (init_tx, init_rx) = std::sync::mpsc::channel();

        std::thread::Builder::new()
            .name("narrator".into())
            .spawn(move || narrator_worker(init_tx, cmd_rx))
            .map_err(|e| NarrationError::Unavailable(e.to_string()))?;

        // The worker reports whether the engine came up before we return.
        match init_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                cmd_tx,
                config,
                events,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(NarrationError::Unavailable(
                "narrator thread exited during startup".into(),
            )),
        }
    }
}

#[async_trait]
impl NarrationProvider for TtsNarrator {
    async fn speak(&self, text: &str, language: &str) -> Result<(), NarrationError> {
        let autoplay = {
            let config = self.config.lock().unwrap();
            config.bool_at("customization.isAutoPlay")
        };
        if !autoplay {
            self.events.add(messages::AUTOPLAY_DISABLED);
            return Ok(());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(NarrateCommand::Speak {
                text: text.to_string(),
                language: language.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| NarrationError::Unavailable("narrator thread stopped".into()))?;

        let result = reply_rx
            .await
            .map_err(|_| NarrationError::Unavailable("narrator thread stopped".into()))?;

        if result.is_ok() {
            self.events.add(messages::PLAYBACK_COMPLETED);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn narrator_worker(
    init_tx: std::sync::mpsc::Sender<Result<(), NarrationError>>,
    mut cmd_rx: mpsc::Receiver<NarrateCommand>,
) {
    let mut engine = match Tts::default() {
        Ok(engine) => {
            let _ = init_tx.send(Ok(()));
            engine
        }
        Err(e) => {
            let _ = init_tx.send(Err(NarrationError::Unavailable(e.to_string())));
            return;
        }
    };

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            NarrateCommand::Speak {
                text,
                language,
                reply,
            } => {
                let result = speak_blocking(&mut engine, &text, &language);
                let _ = reply.send(result);
            }
        }
    }

    log::debug!("narrate: command channel closed, worker shutting down");
}

fn speak_blocking(engine: &mut Tts, text: &str, language: &str) -> Result<(), NarrationError> {
    select_voice(engine, language);

    engine
        .speak(text, true)
        .map_err(|e| NarrationError::Playback(e.to_string()))?;

    std::thread::sleep(SYNTHESIS_GRACE);
    loop {
        match engine.is_speaking() {
            Ok(true) => std::thread::sleep(POLL_INTERVAL),
            Ok(false) => return Ok(()),
            Err(e) => return Err(NarrationError::Playback(e.to_string())),
        }
    }
}

/// Best-effort voice selection: pick the first voice whose language tag
/// shares the primary subtag (`en-US` matches `en`, `en-GB`, …). Backends
/// without voice listing keep their default voice.
fn select_voice(engine: &mut Tts, language: &str) {
    let primary = language
        .split('-')
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase();

    let Ok(voices) = engine.voices() else { return };
    let matching = voices
        .iter()
        .find(|v| v.language().to_string().to_ascii_lowercase().starts_with(&primary));
    if let Some(voice) = matching {
        if let Err(e) = engine.set_voice(voice) {
            log::debug!("narrate: could not select voice for {language}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
