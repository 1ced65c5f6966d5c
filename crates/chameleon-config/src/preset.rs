//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use chameleon_core::EffectSettings;

use crate::error::ConfigError;
use crate::{factory_presets, paths, validation};

/// A named voice: one set of [`EffectSettings`] plus a description.
///
/// # TOML Format
///
/// ```toml
/// name = "Chipmunk"
/// description = "Seven semitones up"
///
/// [settings]
/// pitch_semitones = 7.0
/// volume = 0.8
/// ```
///
/// Fields missing from `[settings]` take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The effect parameters.
    #[serde(default)]
    pub settings: EffectSettings,
}

impl Preset {
    /// A preset with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            settings: EffectSettings::default(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: EffectSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Load a preset from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), name = %preset.name, "loaded preset");
        Ok(preset)
    }

    /// Parse and validate a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let preset: Preset = toml::from_str(toml_str)?;
        validation::validate_preset(&preset)?;
        Ok(preset)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "saved preset");
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Resolves a preset by factory name, user preset name or file path.
///
/// Factory presets win over files of the same name.
pub fn resolve_preset(name: &str) -> Result<Preset, ConfigError> {
    if let Some(preset) = factory_presets::get_factory_preset(name) {
        return Ok(preset);
    }
    match paths::find_preset(name) {
        Some(path) => Preset::load(path),
        None => Err(ConfigError::PresetNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_uses_default_settings() {
        let preset = Preset::new("Plain");
        assert_eq!(preset.name, "Plain");
        assert!(preset.description.is_none());
        assert_eq!(preset.settings, EffectSettings::default());
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let preset = Preset::from_toml(
            r#"
            name = "Up"
            [settings]
            pitch_semitones = 5.0
            low_cut_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(preset.settings.pitch_semitones, 5.0);
        assert!(!preset.settings.low_cut_enabled);
        assert_eq!(preset.settings.volume, 0.7);
        assert!(preset.settings.high_cut_enabled);
    }

    #[test]
    fn missing_settings_table_is_default() {
        let preset = Preset::from_toml("name = \"Bare\"").unwrap();
        assert_eq!(preset.settings, EffectSettings::default());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = Preset::from_toml(
            r#"
            name = "Loud"
            [settings]
            volume = 7.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Preset::from_toml("name = [").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("robot.toml");
        let preset = Preset::new("Robot")
            .with_description("Metallic")
            .with_settings(EffectSettings {
                pitch_semitones: -3.0,
                reverb_amount: 0.4,
                ..EffectSettings::default()
            });

        preset.save(&path).unwrap();
        assert_eq!(Preset::load(&path).unwrap(), preset);
    }

    #[test]
    fn description_omitted_when_absent() {
        let toml = Preset::new("X").to_toml().unwrap();
        assert!(!toml.contains("description"));
        assert!(toml.contains("[settings]"));
    }

    #[test]
    fn resolve_prefers_factory() {
        let preset = resolve_preset("chipmunk").unwrap();
        assert_eq!(preset.settings.pitch_semitones, 7.0);
    }

    #[test]
    fn resolve_by_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.toml");
        Preset::new("Mine").save(&path).unwrap();
        let preset = resolve_preset(path.to_str().unwrap()).unwrap();
        assert_eq!(preset.name, "Mine");
    }

    #[test]
    fn resolve_unknown() {
        let err = resolve_preset("no_such_voice_4711").unwrap_err();
        assert!(matches!(err, ConfigError::PresetNotFound(ref n) if n == "no_such_voice_4711"));
    }
}
