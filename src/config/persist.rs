//! Flat string-keyed persistence for configuration snapshots.
//!
//! [`KvStore`] is the narrow contract the config layer depends on: read a
//! string by key, write a string under a key. [`FileStore`] maps each key to
//! one file in the application config directory; [`MemoryStore`] backs tests
//! and embedded use.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::AppPaths;

// ---------------------------------------------------------------------------
// KvStore
// ---------------------------------------------------------------------------

/// Minimal key-value persistence contract.
///
/// Implementations must be `Send + Sync` so the store can sit behind an
/// `Arc<dyn KvStore>` shared with the config layer.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, if any. Unreadable or missing
    /// entries are both reported as `None`.
    fn read(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// File-backed store: each key becomes `<dir>/<key>.toml`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at an explicit directory (useful for tests).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform config directory.
    pub fn open_default() -> Self {
        Self::new(AppPaths::new().config_dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.toml"))
    }
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, value).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store with the same contract; nothing touches the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.read("settings").is_none());
        store.write("settings", "a = 1").unwrap();
        assert_eq!(store.read("settings").as_deref(), Some("a = 1"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().expect("temp dir");
        let store = FileStore::new(dir.path());
        assert!(store.read("settings").is_none());
        store.write("settings", "[api]\napiKey = \"\"\n").unwrap();
        let read = store.read("settings").expect("read back");
        assert!(read.contains("apiKey"));
        assert!(dir.path().join("settings.toml").exists());
    }

    #[test]
    fn file_store_creates_missing_directories() {
        let dir = tempdir().expect("temp dir");
        let nested = dir.path().join("a").join("b");
        let store = FileStore::new(&nested);
        store.write("settings", "x = true").unwrap();
        assert!(nested.join("settings.toml").exists());
    }
}
