//! Persistent application defaults.

use std::path::{Path, PathBuf};

use chameleon_core::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{paths, validation};

/// File name of the application config inside the user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Defaults read by the CLI before applying command-line flags.
///
/// ```toml
/// output_bit_depth = 24
/// default_preset = "deep"
/// input_device = "USB Microphone"
///
/// [engine]
/// sample_rate = 48000
/// block_size = 512
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sample rate and block size.
    pub engine: EngineConfig,
    /// Bit depth for rendered files.
    pub output_bit_depth: u16,
    /// Preset applied when no effect flags are given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_preset: Option<String>,
    /// Input device name or index for realtime mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name or index for realtime mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output_bit_depth: 16,
            default_preset: None,
            input_device: None,
            output_device: None,
        }
    }
}

impl AppConfig {
    /// `<user config dir>/config.toml`.
    pub fn default_path() -> PathBuf {
        paths::user_config_dir().join(CONFIG_FILE_NAME)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    ///
    /// A file that exists but is unreadable or invalid is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Checks the engine parameters and the bit depth.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_engine(&self.engine)?;
        validation::validate_bit_depth(self.output_bit_depth)?;
        Ok(())
    }
}
