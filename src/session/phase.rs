//! Cycle state machine and shared session state.
//!
//! [`CyclePhase`] is the single source of truth for "is a cycle running" —
//! there are deliberately no separate busy booleans for capture and
//! playback that could drift apart. The two extra flags on
//! [`SessionState`] guard resources that can be busy while the phase is
//! `Idle`: the shared narration channel (replay) and an in-progress voice
//! recording.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// CyclePhase
// ---------------------------------------------------------------------------

/// Phases of one capture→describe→speak cycle.
///
/// ```text
/// Idle ──entry guard + preconditions──▶ Capturing ──▶ PromptBuilding
///                                                         │
///                        Idle ◀── Narrating ◀── Requesting ┘
/// any phase ──failure──▶ Idle   (busy flags cleared, controls re-enabled)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// No cycle in flight.
    Idle,
    /// Grabbing one still frame from the capture source.
    Capturing,
    /// Resolving the final prompt from configuration and transcript.
    PromptBuilding,
    /// The single describe request is in flight.
    Requesting,
    /// Speaking the received description.
    Narrating,
}

impl CyclePhase {
    /// True while a cycle holds the pipeline. New cycles and replays are
    /// rejected while this is set.
    ///
    /// ```
    /// use scene_to_speech::session::CyclePhase;
    ///
    /// assert!(!CyclePhase::Idle.is_busy());
    /// assert!(CyclePhase::Capturing.is_busy());
    /// assert!(CyclePhase::Requesting.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, CyclePhase::Idle)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "Idle",
            CyclePhase::Capturing => "Capturing",
            CyclePhase::PromptBuilding => "PromptBuilding",
            CyclePhase::Requesting => "Requesting",
            CyclePhase::Narrating => "Narrating",
        }
    }
}

impl Default for CyclePhase {
    fn default() -> Self {
        CyclePhase::Idle
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared session state, mutated by the orchestrator.
#[derive(Debug)]
pub struct SessionState {
    /// Current phase of the active cycle (or `Idle`).
    pub phase: CyclePhase,

    /// Most recent successful description; read by replay. `None` until the
    /// first successful cycle.
    pub last_response: Option<String>,

    /// A voice-prompt recording is in progress (between gesture hold
    /// confirmation and the transcript arriving).
    pub transcribing: bool,

    /// The shared narration channel is in use outside a cycle (replay).
    pub narrating: bool,

    /// Whether capture-triggering controls are currently enabled. Cleared
    /// for the duration of a cycle and unconditionally restored afterwards.
    pub controls_enabled: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: CyclePhase::Idle,
            last_response: None,
            transcribing: false,
            narrating: false,
            controls_enabled: true,
        }
    }
}

/// Thread-safe handle to [`SessionState`]. Lock for short critical
/// sections only; never across an `.await` point.
pub type SharedSessionState = Arc<Mutex<SessionState>>;

/// Construct a fresh [`SharedSessionState`].
pub fn new_shared_session() -> SharedSessionState {
    Arc::new(Mutex::new(SessionState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
