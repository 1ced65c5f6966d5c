//! Configuration and preset management for chameleon.
//!
//! - **Presets**: named [`EffectSettings`](chameleon_core::EffectSettings)
//!   stored as TOML
//! - **Validation**: range checks for settings, engine config and bit depth
//! - **Paths**: platform-specific preset and config directories
//! - **Factory presets**: built-in voices that need no files
//! - **App config**: persistent defaults in `config.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use chameleon_config::{Preset, user_presets_dir};
//! use chameleon_core::EffectSettings;
//!
//! let preset = Preset::new("Robot")
//!     .with_description("Flat and metallic")
//!     .with_settings(EffectSettings {
//!         pitch_semitones: -2.0,
//!         reverb_amount: 0.4,
//!         ..EffectSettings::default()
//!     });
//!
//! let path = user_presets_dir().join("robot.toml");
//! preset.save(&path).unwrap();
//! let loaded = chameleon_config::Preset::load(&path).unwrap();
//! assert_eq!(loaded, preset);
//! ```

mod app_config;
mod error;
mod preset;

/// Platform-specific paths for presets and configuration.
pub mod paths;

/// Settings and preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use app_config::{AppConfig, CONFIG_FILE_NAME};
pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use paths::{
    ensure_user_config_dir, ensure_user_presets_dir, find_preset, list_user_presets,
    preset_name_from_path, user_config_dir, user_presets_dir,
};
pub use preset::{Preset, resolve_preset};
pub use validation::{
    ValidationError, ValidationResult, validate_bit_depth, validate_engine, validate_preset,
    validate_settings,
};
