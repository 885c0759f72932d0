//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings snapshot):
//!   Windows: %APPDATA%\scene-to-speech\
//!   macOS:   ~/Library/Application Support/scene-to-speech/
//!   Linux:   ~/.config/scene-to-speech/
//!
//! Data dir (speech models):
//!   Windows: %LOCALAPPDATA%\scene-to-speech\
//!   macOS:   ~/Library/Application Support/scene-to-speech/
//!   Linux:   ~/.local/share/scene-to-speech/

use std::path::PathBuf;

/// Holds all resolved application directory paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for the persisted settings snapshot.
    pub config_dir: PathBuf,
    /// Directory for downloaded GGML speech-model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "scene-to-speech";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let models_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME)
            .join("models");

        Self {
            config_dir,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.models_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .config_dir
            .components()
            .any(|c| c.as_os_str() == "scene-to-speech"));
    }
}
