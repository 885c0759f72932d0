//! The layered configuration store.
//!
//! [`ConfigStore`] keeps two value trees: the compiled defaults (serialized
//! once from [`Settings::default`]) and the working tree, which starts as a
//! deep-merge of the defaults with the persisted snapshot. Reads walk the
//! working tree and fall back to the defaults at any missing or malformed
//! segment; writes touch only the working tree until [`ConfigStore::commit`]
//! serializes it back to the [`KvStore`].
//!
//! Deep-merge rule: for each key, a nested table in the source recurses into
//! the target; any other value replaces the target outright (arrays and
//! scalars are never merged element-wise).

use std::sync::{Arc, Mutex};

use anyhow::Result;
use toml::map::Map;
use toml::Value;

use super::defaults::Settings;
use super::persist::KvStore;

/// Fixed key under which the serialized snapshot lives in the store.
pub const SETTINGS_KEY: &str = "settings";

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Hierarchical configuration with defaults, deep-merge load and explicit
/// commit-on-save semantics.
///
/// ```rust
/// use std::sync::Arc;
/// use scene_to_speech::config::{ConfigStore, MemoryStore};
///
/// let mut config = ConfigStore::load(Arc::new(MemoryStore::new()));
/// assert_eq!(config.str_at("customization.selectedLanguage"), "en-US");
///
/// config.set("customization.selectedLanguage", "fr-FR");
/// assert_eq!(config.str_at("customization.selectedLanguage"), "fr-FR");
/// // Nothing is persisted until commit():
/// config.commit().unwrap();
/// ```
pub struct ConfigStore {
    tree: Value,
    defaults: Value,
    store: Arc<dyn KvStore>,
}

/// Shared handle used by every pipeline stage. Lock briefly; never hold the
/// guard across an `.await` point.
pub type SharedConfig = Arc<Mutex<ConfigStore>>;

/// Construct a [`SharedConfig`] by loading from `store`.
pub fn new_shared_config(store: Arc<dyn KvStore>) -> SharedConfig {
    Arc::new(Mutex::new(ConfigStore::load(store)))
}

impl ConfigStore {
    /// Build the store: serialize the compiled defaults, then deep-merge any
    /// persisted snapshot on top (persisted values win on conflicts, defaults
    /// supply everything the snapshot does not mention).
    ///
    /// A snapshot that fails to parse is ignored with a warning so a damaged
    /// file can never prevent startup.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let defaults =
            Value::try_from(Settings::default()).expect("compiled defaults always serialize");
        let mut tree = defaults.clone();

        if let Some(snapshot) = store.read(SETTINGS_KEY) {
            match snapshot.parse::<Value>() {
                Ok(saved) => deep_merge(&mut tree, &saved),
                Err(e) => log::warn!("config: ignoring unreadable settings snapshot: {e}"),
            }
        }

        Self {
            tree,
            defaults,
            store,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Effective value at a dotted path: the working tree first, then the
    /// compiled defaults. `None` only for paths that exist in neither.
    pub fn get(&self, path: &str) -> Option<Value> {
        lookup(&self.tree, path)
            .or_else(|| lookup(&self.defaults, path))
            .cloned()
    }

    /// String at `path`; falls back to the compiled default when the working
    /// tree is missing or holds a non-string, and to `""` for unknown paths.
    pub fn str_at(&self, path: &str) -> String {
        self.typed(path, |v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Boolean at `path`, with the same fallback chain as [`Self::str_at`].
    pub fn bool_at(&self, path: &str) -> bool {
        self.typed(path, Value::as_bool).unwrap_or_default()
    }

    /// Integer at `path`, with the same fallback chain as [`Self::str_at`].
    pub fn int_at(&self, path: &str) -> i64 {
        self.typed(path, Value::as_integer).unwrap_or_default()
    }

    fn typed<T>(&self, path: &str, extract: impl Fn(&Value) -> Option<T>) -> Option<T> {
        lookup(&self.tree, path)
            .and_then(&extract)
            .or_else(|| lookup(&self.defaults, path).and_then(&extract))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Mutate the in-memory tree only, creating intermediate tables as
    /// needed. Nothing is persisted until [`Self::commit`].
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        set_at(&mut self.tree, path, value.into());
    }

    /// Serialize the entire in-memory tree to the persistence store.
    ///
    /// When `api.saveApiKey` is false the snapshot is written with an empty
    /// `api.apiKey` — the credential never reaches disk unless the user
    /// opted in. The in-memory value is untouched either way.
    pub fn commit(&self) -> Result<()> {
        let mut snapshot = self.tree.clone();
        if !self.bool_at("api.saveApiKey") {
            set_at(&mut snapshot, "api.apiKey", Value::String(String::new()));
        }
        let serialized = toml::to_string_pretty(&snapshot)?;
        self.store.write(SETTINGS_KEY, &serialized)?;
        log::info!("config: settings committed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = tree;
    for part in path.split('.') {
        node = node.as_table()?.get(part)?;
    }
    Some(node)
}

fn set_at(tree: &mut Value, path: &str, value: Value) {
    let mut parts = path.split('.').collect::<Vec<_>>();
    let Some(leaf) = parts.pop() else { return };

    let mut node = tree;
    for part in parts {
        node = ensure_table(node)
            .entry(part.to_string())
            .or_insert_with(|| Value::Table(Map::new()));
    }
    ensure_table(node).insert(leaf.to_string(), value);
}

fn ensure_table(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_table() {
        *node = Value::Table(Map::new());
    }
    match node {
        Value::Table(table) => table,
        _ => unreachable!("node was just made a table"),
    }
}

fn deep_merge(target: &mut Value, source: &Value) {
    let (Value::Table(target_table), Value::Table(source_table)) = (&mut *target, source) else {
        *target = source.clone();
        return;
    };
    for (key, source_value) in source_table {
        match target_table.get_mut(key) {
            Some(target_value) if source_value.is_table() && target_value.is_table() => {
                deep_merge(target_value, source_value);
            }
            _ => {
                target_table.insert(key.clone(), source_value.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
