//! Compiled configuration defaults.
//!
//! Every leaf has a type-stable default so an unset or malformed persisted
//! value always resolves to something usable. Field names are serialized in
//! camelCase to match the persisted snapshot key names.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CameraSettings
// ---------------------------------------------------------------------------

/// Camera selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    /// Identifier of the selected capture device. Empty means "pick the
    /// first available device".
    pub selected_camera_id: String,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            selected_camera_id: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiSettings
// ---------------------------------------------------------------------------

/// Description-service credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiSettings {
    /// Bearer credential for the description endpoint.
    pub api_key: String,
    /// Whether the credential may be written to disk on commit. When false
    /// the snapshot is persisted with an empty `apiKey`.
    pub save_api_key: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            save_api_key: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CustomizationSettings
// ---------------------------------------------------------------------------

/// User-facing behaviour toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomizationSettings {
    /// Base font size in pixels. Only meaningful to a UI front-end; carried
    /// here because it is part of the recognized configuration surface.
    pub font_size: i64,
    /// Speak descriptions automatically. When off, narration short-circuits
    /// to immediate success without producing audio.
    pub is_auto_play: bool,
    /// BCP-47 tag controlling the default prompt and narration voice.
    pub selected_language: String,
    /// Prepend the language default prompt to a spoken voice prompt.
    pub include_default_prompt: bool,
    /// Allow press-and-hold to record a voice prompt at all.
    pub is_voice_prompt_enabled: bool,
    /// Free-text prompt used instead of the language default when non-empty.
    pub custom_prompt: String,
}

impl Default for CustomizationSettings {
    fn default() -> Self {
        Self {
            font_size: 16,
            is_auto_play: true,
            selected_language: "en-US".into(),
            include_default_prompt: true,
            is_voice_prompt_enabled: true,
            custom_prompt: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// DevModeSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DevModeSettings {
    /// Raises orchestrator logging verbosity (the final prompt is echoed to
    /// the event log instead of the debug channel).
    pub is_dev_mode_enabled: bool,
}

impl Default for DevModeSettings {
    fn default() -> Self {
        Self {
            is_dev_mode_enabled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// InputSettings
// ---------------------------------------------------------------------------

/// Global key bindings and gesture timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputSettings {
    /// Key that triggers a capture (tap) or voice prompt (hold).
    pub capture_key: String,
    /// Key that replays the most recent description.
    pub replay_key: String,
    /// Press duration in milliseconds that converts a tap into a
    /// voice-prompt recording start.
    pub hold_threshold_ms: i64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            capture_key: "F9".into(),
            replay_key: "F10".into(),
            hold_threshold_ms: 1200,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings  (top-level)
// ---------------------------------------------------------------------------

/// The full compiled-default tree. [`crate::config::ConfigStore`] serializes
/// this once at construction and works on the resulting value tree, so new
/// fields added here automatically supply defaults for older snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub camera: CameraSettings,
    pub api: ApiSettings,
    pub customization: CustomizationSettings,
    pub dev_mode: DevModeSettings,
    pub input: InputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            api: ApiSettings::default(),
            customization: CustomizationSettings::default(),
            dev_mode: DevModeSettings::default(),
            input: InputSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let s = Settings::default();
        assert_eq!(s.camera.selected_camera_id, "");
        assert_eq!(s.api.api_key, "");
        assert!(!s.api.save_api_key);
        assert_eq!(s.customization.font_size, 16);
        assert!(s.customization.is_auto_play);
        assert_eq!(s.customization.selected_language, "en-US");
        assert!(s.customization.include_default_prompt);
        assert!(s.customization.is_voice_prompt_enabled);
        assert_eq!(s.customization.custom_prompt, "");
        assert!(!s.dev_mode.is_dev_mode_enabled);
        assert_eq!(s.input.capture_key, "F9");
        assert_eq!(s.input.replay_key, "F10");
        assert_eq!(s.input.hold_threshold_ms, 1200);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = toml::Value::try_from(Settings::default()).unwrap();
        let table = value.as_table().unwrap();
        assert!(table.contains_key("devMode"));
        let customization = table["customization"].as_table().unwrap();
        assert!(customization.contains_key("selectedLanguage"));
        assert!(customization.contains_key("includeDefaultPrompt"));
        assert!(customization.contains_key("isVoicePromptEnabled"));
    }

    #[test]
    fn partial_snapshot_fills_missing_fields_with_defaults() {
        let partial = "[customization]\nselectedLanguage = \"fr-FR\"\n";
        let s: Settings = toml::from_str(partial).unwrap();
        assert_eq!(s.customization.selected_language, "fr-FR");
        // Untouched leaves keep their compiled defaults.
        assert_eq!(s.customization.font_size, 16);
        assert_eq!(s.input.capture_key, "F9");
    }
}
