//! Range checks for settings, presets and engine parameters.
//!
//! [`EffectSettings::sanitized`](chameleon_core::EffectSettings::sanitized)
//! silently clamps; these functions report instead, so a preset file with a
//! typo'd `pitch_semitones = 70` is rejected rather than played at +12.
//!
//! # Example
//!
//! ```rust
//! use chameleon_config::validate_settings;
//! use chameleon_core::EffectSettings;
//!
//! assert!(validate_settings(&EffectSettings::default()).is_ok());
//!
//! let loud = EffectSettings { volume: 9.0, ..EffectSettings::default() };
//! assert!(validate_settings(&loud).is_err());
//! ```

use chameleon_core::settings::{PITCH_MAX, PITCH_MIN, VOLUME_MAX};
use chameleon_core::{EffectSettings, EngineConfig, FilterBank};
use thiserror::Error;

use crate::Preset;

/// Smallest accepted transport block in frames.
pub const MIN_BLOCK_SIZE: usize = 16;
/// Largest accepted transport block in frames.
pub const MAX_BLOCK_SIZE: usize = 16384;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the field.
        field: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// NaN or infinite value.
    #[error("'{field}' is not a finite number")]
    NonFinite {
        /// Name of the field.
        field: String,
    },

    /// Value of the right type but unusable.
    #[error("invalid '{field}': {reason}")]
    Invalid {
        /// Name of the field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Option<ValidationError> {
    if !value.is_finite() {
        return Some(ValidationError::NonFinite {
            field: field.to_string(),
        });
    }
    (value < min || value > max).then(|| ValidationError::OutOfRange {
        field: field.to_string(),
        value,
        min,
        max,
    })
}

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Checks every field of `settings` against its documented range.
///
/// All problems are reported together.
pub fn validate_settings(settings: &EffectSettings) -> ValidationResult<()> {
    let errors = [
        check_range("pitch_semitones", settings.pitch_semitones, PITCH_MIN, PITCH_MAX),
        check_range("volume", settings.volume, 0.0, VOLUME_MAX),
        check_range("echo_amount", settings.echo_amount, 0.0, 1.0),
        check_range("reverb_amount", settings.reverb_amount, 0.0, 1.0),
        check_range("gate_threshold", settings.gate_threshold, 0.0, 1.0),
    ]
    .into_iter()
    .flatten()
    .collect();
    collect(errors)
}

/// Checks a preset's name and settings.
pub fn validate_preset(preset: &Preset) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if preset.name.trim().is_empty() {
        errors.push(ValidationError::Invalid {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    match validate_settings(&preset.settings) {
        Ok(()) => {}
        Err(ValidationError::Multiple(inner)) => errors.extend(inner),
        Err(err) => errors.push(err),
    }
    collect(errors)
}

/// Checks that the filters can be designed at the sample rate and that the
/// block size is usable.
pub fn validate_engine(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if let Err(err) = FilterBank::build(config.sample_rate) {
        errors.push(ValidationError::Invalid {
            field: "sample_rate".into(),
            reason: err.to_string(),
        });
    }
    if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&config.block_size) {
        errors.push(ValidationError::OutOfRange {
            field: "block_size".into(),
            value: config.block_size as f32,
            min: MIN_BLOCK_SIZE as f32,
            max: MAX_BLOCK_SIZE as f32,
        });
    }
    collect(errors)
}

/// Accepts the WAV bit depths the writer supports: 16, 24 and 32.
pub fn validate_bit_depth(bits: u16) -> ValidationResult<()> {
    match bits {
        16 | 24 | 32 => Ok(()),
        other => Err(ValidationError::Invalid {
            field: "bit_depth".into(),
            reason: format!("{other} is not one of 16, 24, 32"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_settings(&EffectSettings::default()).is_ok());
        assert!(validate_settings(&EffectSettings::bypass()).is_ok());
        assert!(validate_engine(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn single_error_is_not_wrapped() {
        let s = EffectSettings {
            pitch_semitones: 13.0,
            ..EffectSettings::default()
        };
        assert_eq!(
            validate_settings(&s),
            Err(ValidationError::OutOfRange {
                field: "pitch_semitones".into(),
                value: 13.0,
                min: -12.0,
                max: 12.0,
            })
        );
    }

    #[test]
    fn multiple_errors_are_collected() {
        let s = EffectSettings {
            volume: -0.5,
            echo_amount: f32::NAN,
            gate_threshold: 1.5,
            ..EffectSettings::default()
        };
        let Err(ValidationError::Multiple(errs)) = validate_settings(&s) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errs.len(), 3);
        assert!(errs.contains(&ValidationError::NonFinite {
            field: "echo_amount".into()
        }));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let s = EffectSettings {
            pitch_semitones: -12.0,
            volume: VOLUME_MAX,
            echo_amount: 1.0,
            reverb_amount: 0.0,
            gate_threshold: 1.0,
            ..EffectSettings::default()
        };
        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn preset_name_required() {
        let preset = Preset::new("  ");
        let err = validate_preset(&preset).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn preset_merges_setting_errors() {
        let preset = Preset::new("").with_settings(EffectSettings {
            volume: 5.0,
            reverb_amount: 2.0,
            ..EffectSettings::default()
        });
        let Err(ValidationError::Multiple(errs)) = validate_preset(&preset) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn engine_rejects_low_rate_and_bad_block() {
        assert!(validate_engine(&EngineConfig::new(6000, 1024)).is_err());
        assert!(validate_engine(&EngineConfig::new(8000, 1024)).is_ok());
        assert!(validate_engine(&EngineConfig::new(44100, 0)).is_err());
        assert!(validate_engine(&EngineConfig::new(44100, MAX_BLOCK_SIZE + 1)).is_err());
    }

    #[test]
    fn bit_depths() {
        for bits in [16, 24, 32] {
            assert!(validate_bit_depth(bits).is_ok());
        }
        assert!(validate_bit_depth(8).is_err());
    }
}
