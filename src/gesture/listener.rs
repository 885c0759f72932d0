//! Dedicated OS-thread input listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`PressListener`] owns that thread and a stop flag; dropping it sets the
//! flag so the callback silently ignores further events. The thread itself
//! remains blocked inside the rdev event loop until the process exits —
//! rdev has no graceful shutdown API and holds no resources that need
//! explicit cleanup.
//!
//! Two keys are watched: the capture key is forwarded as raw
//! press/release [`GestureEvent`]s (OS key auto-repeat is filtered here so
//! the controller sees one `Pressed` per physical press), and the replay
//! key sends [`SessionCommand::Replay`] directly.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use crate::session::SessionCommand;

use super::GestureEvent;

// ---------------------------------------------------------------------------
// PressListener
// ---------------------------------------------------------------------------

/// Handle to a running global-input listener thread.
pub struct PressListener {
    /// Shared stop flag — set `true` on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Kept so the thread is not detached prematurely; never joined because
    /// `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl PressListener {
    /// Spawn the listener thread.
    ///
    /// * `capture_key` — tap/hold gesture key; press and release are
    ///   forwarded on `gesture_tx` (`blocking_send`, safe off-runtime).
    /// * `replay_key` — sends [`SessionCommand::Replay`] on each press.
    pub fn start(
        capture_key: rdev::Key,
        replay_key: rdev::Key,
        gesture_tx: mpsc::Sender<GestureEvent>,
        command_tx: mpsc::Sender<SessionCommand>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("press-listener".into())
            .spawn(move || {
                // Auto-repeat filters: true while the physical key is down.
                let mut capture_down = false;
                let mut replay_down = false;

                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    match event.event_type {
                        rdev::EventType::KeyPress(k) if k == capture_key => {
                            if !capture_down {
                                capture_down = true;
                                let _ = gesture_tx.blocking_send(GestureEvent::Pressed);
                            }
                        }
                        rdev::EventType::KeyRelease(k) if k == capture_key => {
                            capture_down = false;
                            let _ = gesture_tx.blocking_send(GestureEvent::Released);
                        }
                        rdev::EventType::KeyPress(k) if k == replay_key => {
                            if !replay_down {
                                replay_down = true;
                                let _ = command_tx.blocking_send(SessionCommand::Replay);
                            }
                        }
                        rdev::EventType::KeyRelease(k) if k == replay_key => {
                            replay_down = false;
                        }
                        _ => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("press-listener: rdev::listen exited with error: {e:?}");
                }
            })
            .expect("failed to spawn press-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for PressListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from configuration into an [`rdev::Key`].
///
/// Supports `F1`–`F12`, a few named keys, and single ASCII letters. Returns
/// `None` for unrecognised names so callers can fall back to a default.
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let key = match name {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "Space" => Key::Space,
        "Return" | "Enter" => Key::Return,
        "Tab" => Key::Tab,
        "Escape" | "Esc" => Key::Escape,
        other => return single_letter(other),
    };
    Some(key)
}

fn single_letter(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let mut chars = name.chars();
    let (letter, rest) = (chars.next()?, chars.next());
    if rest.is_some() {
        return None;
    }
    let key = match letter.to_ascii_lowercase() {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
