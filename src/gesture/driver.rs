//! Async driver around [`GestureController`].
//!
//! The controller is synchronous; this loop owns its timers. On
//! `ArmHoldTimer` a one-shot task sleeps for the hold threshold and feeds
//! `HoldElapsed` back through an internal channel, so timer-vs-release
//! ordering is decided by event arrival — exactly the race the controller
//! is built to resolve. The loop ends when the input channel closes.

use tokio::sync::mpsc;

use crate::config::SharedConfig;
use crate::session::SessionCommand;

use super::{GestureAction, GestureController, GestureEvent};

/// Drive `controller` until `event_rx` is closed.
///
/// Resolved actions are forwarded to the orchestrator on `command_tx`.
/// Gesture settings are re-read from `config` on every press, so changes to
/// the hold threshold or the voice-prompt toggle apply immediately.
pub async fn run_gesture_loop(
    mut controller: GestureController,
    mut event_rx: mpsc::Receiver<GestureEvent>,
    command_tx: mpsc::Sender<SessionCommand>,
    config: SharedConfig,
) {
    // Armed hold timers deliver back through this internal channel; it never
    // closes while the loop runs because the sender is held here.
    let (timer_tx, mut timer_rx) = mpsc::channel::<GestureEvent>(4);

    loop {
        let event = tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            Some(event) = timer_rx.recv() => event,
        };

        if event == GestureEvent::Pressed {
            let (threshold_ms, voice_enabled) = {
                let config = config.lock().unwrap();
                (
                    config.int_at("input.holdThresholdMs"),
                    config.bool_at("customization.isVoicePromptEnabled"),
                )
            };
            controller.update_settings(
                std::time::Duration::from_millis(threshold_ms.max(0) as u64),
                voice_enabled,
            );
        }

        for action in controller.handle(event) {
            match action {
                GestureAction::ArmHoldTimer { generation } => {
                    let tx = timer_tx.clone();
                    let threshold = controller.hold_threshold();
                    tokio::spawn(async move {
                        tokio::time::sleep(threshold).await;
                        let _ = tx.send(GestureEvent::HoldElapsed { generation }).await;
                    });
                }
                GestureAction::CaptureNow => {
                    let _ = command_tx.send(SessionCommand::Capture).await;
                }
                GestureAction::BeginVoiceCapture => {
                    let _ = command_tx.send(SessionCommand::BeginVoicePrompt).await;
                }
                GestureAction::EndVoiceCapture => {
                    let _ = command_tx.send(SessionCommand::EndVoicePrompt).await;
                }
            }
        }
    }

    log::info!("gesture: event channel closed, driver shutting down");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
