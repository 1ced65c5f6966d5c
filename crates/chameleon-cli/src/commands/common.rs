//! Shared CLI arguments and helpers used across multiple commands.

use std::sync::Arc;

use chameleon_config::{AppConfig, resolve_preset, validate_bit_depth, validate_engine, validate_settings};
use chameleon_core::{EffectChain, EffectSettings, EngineConfig};
use clap::Args;

/// Effect flags shared by `process`, `batch`, `realtime` and `presets save`.
///
/// A preset (or the configured default preset) supplies the base settings;
/// explicit flags override individual fields.
#[derive(Args, Debug, Clone, Default)]
pub struct EffectArgs {
    /// Preset name or path to a preset TOML file
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Pitch shift in semitones (-12 to 12)
    #[arg(long, allow_hyphen_values = true)]
    pub pitch: Option<f32>,

    /// Output volume multiplier (0 to 2)
    #[arg(long)]
    pub volume: Option<f32>,

    /// Echo amount (0 to 1)
    #[arg(long)]
    pub echo: Option<f32>,

    /// Reverb amount (0 to 1)
    #[arg(long)]
    pub reverb: Option<f32>,

    /// Noise gate threshold as a fraction of the peak (0 disables)
    #[arg(long)]
    pub gate: Option<f32>,

    /// Disable the 300 Hz low-cut filter
    #[arg(long)]
    pub no_low_cut: bool,

    /// Disable the 3 kHz high-cut filter
    #[arg(long)]
    pub no_high_cut: bool,
}

impl EffectArgs {
    /// Resolves the preset, applies the flag overrides and validates the result.
    pub fn resolve(&self, config: &AppConfig) -> anyhow::Result<EffectSettings> {
        let base = match self.preset.as_deref().or(config.default_preset.as_deref()) {
            Some(name) => {
                let preset = resolve_preset(name).map_err(|e| {
                    anyhow::anyhow!("{e}. Use 'chameleon presets list' to see available presets.")
                })?;
                tracing::info!(preset = %preset.name, "using preset");
                preset.settings
            }
            None => EffectSettings::default(),
        };

        let settings = self.apply(base);
        validate_settings(&settings)?;
        Ok(settings)
    }

    fn apply(&self, mut settings: EffectSettings) -> EffectSettings {
        if let Some(v) = self.pitch {
            settings.pitch_semitones = v;
        }
        if let Some(v) = self.volume {
            settings.volume = v;
        }
        if let Some(v) = self.echo {
            settings.echo_amount = v;
        }
        if let Some(v) = self.reverb {
            settings.reverb_amount = v;
        }
        if let Some(v) = self.gate {
            settings.gate_threshold = v;
        }
        if self.no_low_cut {
            settings.low_cut_enabled = false;
        }
        if self.no_high_cut {
            settings.high_cut_enabled = false;
        }
        settings
    }
}

/// Engine overrides shared by the processing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Processing sample rate in Hz (input is resampled to it)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Realtime block size in frames
    #[arg(long)]
    pub block_size: Option<usize>,
}

impl EngineArgs {
    /// Config values overridden by any flags given, validated.
    pub fn resolve(&self, config: &AppConfig) -> anyhow::Result<EngineConfig> {
        let engine = EngineConfig::new(
            self.sample_rate.unwrap_or(config.engine.sample_rate),
            self.block_size.unwrap_or(config.engine.block_size),
        );
        validate_engine(&engine)?;
        Ok(engine)
    }
}

/// Builds the shared effect chain for `engine`.
pub fn build_chain(engine: EngineConfig) -> anyhow::Result<Arc<EffectChain>> {
    Ok(Arc::new(EffectChain::new(engine)?))
}

/// Bit depth from the flag or the config, validated.
pub fn resolve_bit_depth(flag: Option<u16>, config: &AppConfig) -> anyhow::Result<u16> {
    let bits = flag.unwrap_or(config.output_bit_depth);
    validate_bit_depth(bits)?;
    Ok(bits)
}

/// One-line summary of the active settings.
pub fn describe(settings: &EffectSettings) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    format!(
        "pitch {:+.1} st, volume {:.2}, echo {:.2}, reverb {:.2}, gate {:.2}, low cut {}, high cut {}",
        settings.pitch_semitones,
        settings.volume,
        settings.echo_amount,
        settings.reverb_amount,
        settings.gate_threshold,
        on_off(settings.low_cut_enabled),
        on_off(settings.high_cut_enabled),
    )
}

/// Converts a linear amplitude to dBFS, floored at -120.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
