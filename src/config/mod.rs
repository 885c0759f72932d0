//! Layered configuration for scene-to-speech.
//!
//! Compiled defaults (typed structs in [`defaults`]) are deep-merged with a
//! persisted snapshot at construction time; consumers read effective values
//! through dotted paths on [`ConfigStore`]. Mutations stay in memory until
//! an explicit [`ConfigStore::commit`].

pub mod defaults;
pub mod paths;
pub mod persist;
pub mod store;

pub use defaults::Settings;
pub use paths::AppPaths;
pub use persist::{FileStore, KvStore, MemoryStore};
pub use store::{new_shared_config, ConfigStore, SharedConfig, SETTINGS_KEY};
