//! The capture→describe→speak session core.
//!
//! [`SessionOrchestrator`] sequences one cycle at a time through
//! [`CyclePhase`], rejecting concurrent requests instead of queueing them.
//! Commands arrive over a `tokio::sync::mpsc` channel, usually from the
//! gesture driver.

pub mod orchestrator;
pub mod phase;

pub use orchestrator::{SessionError, SessionOrchestrator};
pub use phase::{new_shared_session, CyclePhase, SessionState, SharedSessionState};

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

/// Commands accepted by the orchestrator's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Run an immediate capture cycle with the configured prompt.
    Capture,
    /// Start recording a spoken prompt.
    BeginVoicePrompt,
    /// Stop recording; the transcript drives a capture cycle.
    EndVoicePrompt,
    /// Speak the most recent description again.
    Replay,
}
