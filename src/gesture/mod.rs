//! Tap-vs-hold gesture disambiguation.
//!
//! A single logical input device produces press/release events; the
//! controller resolves each press into exactly one of two actions:
//!
//! ```text
//! Idle ──press──▶ Pressed ──release before threshold──▶ capture now
//!                    │
//!                    └──hold threshold elapses──▶ HoldConfirmed
//!                           (begin voice capture)      │
//!                                                      └──release──▶ end
//!                                                          voice capture
//! Any release returns to Idle.
//! ```
//!
//! Resolution is a race between the hold timer and the release: whichever
//! event arrives first wins, and the loser becomes a no-op. The controller
//! itself is synchronous and deterministic — timers are armed by the async
//! [`driver`] and delivered back as [`GestureEvent::HoldElapsed`] carrying a
//! generation number, so a stale timer from an already-released press can
//! never start a recording.

pub mod driver;
pub mod listener;

pub use driver::run_gesture_loop;
pub use listener::{parse_key, PressListener};

use std::time::Duration;

// ---------------------------------------------------------------------------
// Events and actions
// ---------------------------------------------------------------------------

/// Raw input delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// The capture control was pressed down.
    Pressed,
    /// The capture control was released.
    Released,
    /// The pointer left the control while pressed (touch/mouse parity:
    /// treated exactly like a release).
    PointerLeft,
    /// The hold timer armed for generation `generation` fired.
    HoldElapsed { generation: u64 },
}

/// Actions the controller asks its driver to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    /// Run an immediate capture cycle.
    CaptureNow,
    /// Start recording a voice prompt.
    BeginVoiceCapture,
    /// Stop the voice-prompt recording (the transcript then drives a cycle).
    EndVoiceCapture,
    /// Arm a one-shot hold timer for the current press.
    ArmHoldTimer { generation: u64 },
}

// ---------------------------------------------------------------------------
// GestureController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    /// `timer_armed` is false when voice prompts are disabled — the press
    /// then sits in a degenerate Pressed state until release.
    Pressed { timer_armed: bool },
    HoldConfirmed,
}

/// The tap/hold state machine. Feed it events with [`handle`], perform the
/// returned actions.
///
/// [`handle`]: GestureController::handle
///
/// ```rust
/// use scene_to_speech::gesture::{GestureAction, GestureController, GestureEvent};
/// use std::time::Duration;
///
/// let mut controller = GestureController::new(Duration::from_millis(1200), true);
/// let armed = controller.handle(GestureEvent::Pressed);
/// assert!(matches!(armed[0], GestureAction::ArmHoldTimer { .. }));
/// let released = controller.handle(GestureEvent::Released);
/// assert_eq!(released, vec![GestureAction::CaptureNow]);
/// ```
#[derive(Debug)]
pub struct GestureController {
    state: PressState,
    /// Incremented whenever a pending timer becomes stale; only a
    /// `HoldElapsed` carrying the current value is honoured.
    generation: u64,
    hold_threshold: Duration,
    voice_prompt_enabled: bool,
}

impl GestureController {
    pub fn new(hold_threshold: Duration, voice_prompt_enabled: bool) -> Self {
        Self {
            state: PressState::Idle,
            generation: 0,
            hold_threshold,
            voice_prompt_enabled,
        }
    }

    /// Duration a press must be held before it becomes a voice capture.
    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }

    /// Refresh settings from configuration; takes effect on the next press.
    pub fn update_settings(&mut self, hold_threshold: Duration, voice_prompt_enabled: bool) {
        self.hold_threshold = hold_threshold;
        self.voice_prompt_enabled = voice_prompt_enabled;
    }

    /// Advance the state machine. Duplicate or out-of-order events (repeated
    /// presses from key auto-repeat, duplicate releases, stale timers) are
    /// no-ops.
    pub fn handle(&mut self, event: GestureEvent) -> Vec<GestureAction> {
        match event {
            GestureEvent::Pressed => self.on_pressed(),
            GestureEvent::Released | GestureEvent::PointerLeft => self.on_released(),
            GestureEvent::HoldElapsed { generation } => self.on_hold_elapsed(generation),
        }
    }

    fn on_pressed(&mut self) -> Vec<GestureAction> {
        if self.state != PressState::Idle {
            return Vec::new();
        }
        if !self.voice_prompt_enabled {
            self.state = PressState::Pressed { timer_armed: false };
            return Vec::new();
        }
        self.generation += 1;
        self.state = PressState::Pressed { timer_armed: true };
        vec![GestureAction::ArmHoldTimer {
            generation: self.generation,
        }]
    }

    fn on_released(&mut self) -> Vec<GestureAction> {
        // Invalidate any pending timer before anything else; the hold flag
        // is cleared on every release regardless of outcome.
        self.generation += 1;
        match std::mem::replace(&mut self.state, PressState::Idle) {
            PressState::Idle => Vec::new(),
            PressState::Pressed { .. } => vec![GestureAction::CaptureNow],
            PressState::HoldConfirmed => vec![GestureAction::EndVoiceCapture],
        }
    }

    fn on_hold_elapsed(&mut self, generation: u64) -> Vec<GestureAction> {
        let armed = matches!(self.state, PressState::Pressed { timer_armed: true });
        if !armed || generation != self.generation {
            return Vec::new();
        }
        self.state = PressState::HoldConfirmed;
        vec![GestureAction::BeginVoiceCapture]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> GestureController {
        GestureController::new(Duration::from_millis(1200), true)
    }

    fn timer_generation(actions: &[GestureAction]) -> u64 {
        match actions {
            [GestureAction::ArmHoldTimer { generation }] => *generation,
            other => panic!("expected a single ArmHoldTimer, got {other:?}"),
        }
    }

    // ---- tap -------------------------------------------------------------

    #[test]
    fn release_before_timer_fires_captures_once() {
        let mut c = controller();
        let armed = c.handle(GestureEvent::Pressed);
        let generation = timer_generation(&armed);

        // Release at 500 ms — before the 1200 ms timer.
        assert_eq!(c.handle(GestureEvent::Released), vec![GestureAction::CaptureNow]);

        // The timer later fires anyway (delayed delivery): must be a no-op.
        assert!(c.handle(GestureEvent::HoldElapsed { generation }).is_empty());
    }

    #[test]
    fn duplicate_release_is_a_no_op() {
        let mut c = controller();
        c.handle(GestureEvent::Pressed);
        assert_eq!(c.handle(GestureEvent::Released), vec![GestureAction::CaptureNow]);
        assert!(c.handle(GestureEvent::Released).is_empty());
    }

    #[test]
    fn pointer_leave_while_pressed_acts_as_tap_release() {
        let mut c = controller();
        c.handle(GestureEvent::Pressed);
        assert_eq!(
            c.handle(GestureEvent::PointerLeft),
            vec![GestureAction::CaptureNow]
        );
    }

    // ---- hold ------------------------------------------------------------

    #[test]
    fn timer_firing_first_begins_voice_capture_once() {
        let mut c = controller();
        let generation = timer_generation(&c.handle(GestureEvent::Pressed));

        // Timer fires at 1200 ms; release arrives at 1500 ms.
        assert_eq!(
            c.handle(GestureEvent::HoldElapsed { generation }),
            vec![GestureAction::BeginVoiceCapture]
        );
        assert_eq!(
            c.handle(GestureEvent::Released),
            vec![GestureAction::EndVoiceCapture]
        );

        // No capture action anywhere in the sequence.
    }

    #[test]
    fn hold_timer_fires_only_once() {
        let mut c = controller();
        let generation = timer_generation(&c.handle(GestureEvent::Pressed));
        assert_eq!(
            c.handle(GestureEvent::HoldElapsed { generation }),
            vec![GestureAction::BeginVoiceCapture]
        );
        // A duplicate delivery of the same timer is a no-op.
        assert!(c.handle(GestureEvent::HoldElapsed { generation }).is_empty());
    }

    #[test]
    fn pointer_leave_while_hold_confirmed_ends_voice_capture() {
        let mut c = controller();
        let generation = timer_generation(&c.handle(GestureEvent::Pressed));
        c.handle(GestureEvent::HoldElapsed { generation });
        assert_eq!(
            c.handle(GestureEvent::PointerLeft),
            vec![GestureAction::EndVoiceCapture]
        );
    }

    #[test]
    fn stale_timer_from_previous_press_is_ignored() {
        let mut c = controller();
        let stale = timer_generation(&c.handle(GestureEvent::Pressed));
        c.handle(GestureEvent::Released);

        // New press arms a new generation.
        let fresh = timer_generation(&c.handle(GestureEvent::Pressed));
        assert_ne!(stale, fresh);

        // The stale timer fires during the new press: must not confirm hold.
        assert!(c.handle(GestureEvent::HoldElapsed { generation: stale }).is_empty());

        // The fresh timer still works.
        assert_eq!(
            c.handle(GestureEvent::HoldElapsed { generation: fresh }),
            vec![GestureAction::BeginVoiceCapture]
        );
    }

    // ---- key auto-repeat -------------------------------------------------

    #[test]
    fn repeated_press_while_held_is_ignored() {
        let mut c = controller();
        c.handle(GestureEvent::Pressed);
        assert!(c.handle(GestureEvent::Pressed).is_empty());
        assert!(c.handle(GestureEvent::Pressed).is_empty());
        assert_eq!(c.handle(GestureEvent::Released), vec![GestureAction::CaptureNow]);
    }

    // ---- voice prompts disabled ------------------------------------------

    #[test]
    fn disabled_voice_prompts_arm_no_timer() {
        let mut c = GestureController::new(Duration::from_millis(1200), false);
        assert!(c.handle(GestureEvent::Pressed).is_empty());
        assert_eq!(c.handle(GestureEvent::Released), vec![GestureAction::CaptureNow]);
    }

    #[test]
    fn settings_update_applies_to_next_press() {
        let mut c = controller();
        c.update_settings(Duration::from_millis(800), false);
        assert_eq!(c.hold_threshold(), Duration::from_millis(800));
        assert!(c.handle(GestureEvent::Pressed).is_empty());
    }
}
