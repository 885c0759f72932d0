//! Append-only, user-visible event log.
//!
//! Every user-relevant action and failure is recorded here in plain
//! language; entries are additionally mirrored to the `log` facade so the
//! same information reaches stderr. The log is append-only — nothing ever
//! removes or rewrites an entry.

use std::sync::{Arc, Mutex};

/// One recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub is_error: bool,
}

/// Cheap-to-clone handle to the shared append-only log.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a status entry.
    pub fn add(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.push(message, false);
    }

    /// Append an error entry.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.push(message, true);
    }

    /// Snapshot of all entries recorded so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.message.contains(needle))
    }

    fn push(&self, message: String, is_error: bool) {
        self.entries.lock().unwrap().push(LogEntry { message, is_error });
    }
}
