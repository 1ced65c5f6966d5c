//! Effect parameters and engine configuration.
//!
//! [`EffectSettings`] is a plain `Copy` value: every processing call works on
//! one snapshot, so a block never sees half of an update. [`SharedSettings`]
//! is the handle the control surface mutates while the audio thread reads.
//!
//! ```rust
//! use chameleon_core::SharedSettings;
//!
//! let shared = SharedSettings::default();
//! let audio_side = shared.clone();
//!
//! shared.set_pitch_semitones(4.0);
//! shared.set_echo_amount(0.3);
//!
//! let snap = audio_side.snapshot();
//! assert_eq!(snap.pitch_semitones, 4.0);
//! assert_eq!(snap.echo_amount, 0.3);
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Lowest supported pitch shift in semitones.
pub const PITCH_MIN: f32 = -12.0;
/// Highest supported pitch shift in semitones.
pub const PITCH_MAX: f32 = 12.0;
/// Largest volume accepted from presets and the command line.
///
/// The engine itself only requires `volume >= 0`.
pub const VOLUME_MAX: f32 = 2.0;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Default transport block size in frames.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// User-facing effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Pitch shift in semitones, `[-12, 12]`. Zero bypasses the shifter.
    pub pitch_semitones: f32,
    /// Output gain multiplier, `>= 0`.
    pub volume: f32,
    /// Echo strength, `[0, 1]`. Zero bypasses.
    pub echo_amount: f32,
    /// Reverb amount, `[0, 1]`. Zero bypasses.
    pub reverb_amount: f32,
    /// Gate threshold as a fraction of the buffer peak, `[0, 1]`. Zero bypasses.
    pub gate_threshold: f32,
    /// Enable the 300 Hz high-pass.
    pub low_cut_enabled: bool,
    /// Enable the 3 kHz low-pass.
    pub high_cut_enabled: bool,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pitch_semitones: 0.0,
            volume: 0.7,
            echo_amount: 0.0,
            reverb_amount: 0.0,
            gate_threshold: 0.2,
            low_cut_enabled: true,
            high_cut_enabled: true,
        }
    }
}

impl EffectSettings {
    /// Settings that reduce the chain to volume and the peak clamp.
    ///
    /// Gate, filters, pitch, echo and reverb are all disabled; volume stays at
    /// its default.
    pub fn bypass() -> Self {
        Self {
            gate_threshold: 0.0,
            low_cut_enabled: false,
            high_cut_enabled: false,
            ..Self::default()
        }
    }

    /// Returns a copy with every field clamped into its documented range.
    ///
    /// Non-finite values fall back to the field's default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            pitch_semitones: clamp_finite(
                self.pitch_semitones,
                PITCH_MIN,
                PITCH_MAX,
                defaults.pitch_semitones,
            ),
            volume: clamp_finite(self.volume, 0.0, f32::MAX, defaults.volume),
            echo_amount: clamp_finite(self.echo_amount, 0.0, 1.0, defaults.echo_amount),
            reverb_amount: clamp_finite(self.reverb_amount, 0.0, 1.0, defaults.reverb_amount),
            gate_threshold: clamp_finite(self.gate_threshold, 0.0, 1.0, defaults.gate_threshold),
            low_cut_enabled: self.low_cut_enabled,
            high_cut_enabled: self.high_cut_enabled,
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Lock-free settings handle shared between the control surface and the
/// audio thread.
///
/// Clones share the same underlying value. Writers publish a whole new
/// [`EffectSettings`]; readers load the latest published snapshot without
/// blocking.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<ArcSwap<EffectSettings>>,
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(EffectSettings::default())
    }
}

impl SharedSettings {
    /// Creates a handle holding `settings` (sanitized).
    pub fn new(settings: EffectSettings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings.sanitized())),
        }
    }

    /// Current settings as a single consistent copy.
    pub fn snapshot(&self) -> EffectSettings {
        **self.inner.load()
    }

    /// Replaces every field at once.
    pub fn replace(&self, settings: EffectSettings) {
        self.inner.store(Arc::new(settings.sanitized()));
    }

    /// Applies `f` to the current value and publishes the result.
    pub fn update(&self, f: impl Fn(&mut EffectSettings)) {
        self.inner.rcu(|current| {
            let mut next = **current;
            f(&mut next);
            next.sanitized()
        });
    }

    /// Sets the pitch shift in semitones.
    pub fn set_pitch_semitones(&self, value: f32) {
        self.update(|s| s.pitch_semitones = value);
    }

    /// Sets the output volume multiplier.
    pub fn set_volume(&self, value: f32) {
        self.update(|s| s.volume = value);
    }

    /// Sets the echo strength.
    pub fn set_echo_amount(&self, value: f32) {
        self.update(|s| s.echo_amount = value);
    }

    /// Sets the reverb amount.
    pub fn set_reverb_amount(&self, value: f32) {
        self.update(|s| s.reverb_amount = value);
    }

    /// Sets the gate threshold fraction.
    pub fn set_gate_threshold(&self, value: f32) {
        self.update(|s| s.gate_threshold = value);
    }

    /// Enables or disables the low-cut filter.
    pub fn set_low_cut_enabled(&self, enabled: bool) {
        self.update(|s| s.low_cut_enabled = enabled);
    }

    /// Enables or disables the high-cut filter.
    pub fn set_high_cut_enabled(&self, enabled: bool) {
        self.update(|s| s.high_cut_enabled = enabled);
    }
}

/// Session-wide engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Processing sample rate in Hz.
    pub sample_rate: u32,
    /// Transport block size in frames.
    pub block_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Config with the given rate and block size.
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Duration of one block in milliseconds.
    pub fn block_duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.block_size as f64 * 1000.0 / f64::from(self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_voice_preset() {
        let s = EffectSettings::default();
        assert_eq!(s.gate_threshold, 0.2);
        assert!(s.low_cut_enabled && s.high_cut_enabled);
        assert_eq!(s.pitch_semitones, 0.0);
        assert_eq!(s.echo_amount, 0.0);
        assert_eq!(s.reverb_amount, 0.0);
        assert_eq!(s.volume, 0.7);
    }

    #[test]
    fn sanitized_clamps_and_replaces_nan() {
        let s = EffectSettings {
            pitch_semitones: 40.0,
            volume: f32::NAN,
            echo_amount: -1.0,
            reverb_amount: 3.0,
            gate_threshold: f32::INFINITY,
            ..EffectSettings::default()
        }
        .sanitized();

        assert_eq!(s.pitch_semitones, PITCH_MAX);
        assert_eq!(s.volume, 0.7);
        assert_eq!(s.echo_amount, 0.0);
        assert_eq!(s.reverb_amount, 1.0);
        assert_eq!(s.gate_threshold, 0.2);
    }

    #[test]
    fn sanitized_keeps_large_volume() {
        let s = EffectSettings {
            volume: 5.0,
            ..EffectSettings::default()
        }
        .sanitized();
        assert_eq!(s.volume, 5.0);

        let s = EffectSettings {
            volume: -1.0,
            ..EffectSettings::default()
        }
        .sanitized();
        assert_eq!(s.volume, 0.0);
    }

    #[test]
    fn shared_setters_are_visible_to_clones() {
        let shared = SharedSettings::default();
        let reader = shared.clone();

        shared.set_low_cut_enabled(false);
        shared.set_gate_threshold(0.5);
        shared.set_reverb_amount(0.25);

        let snap = reader.snapshot();
        assert!(!snap.low_cut_enabled);
        assert_eq!(snap.gate_threshold, 0.5);
        assert_eq!(snap.reverb_amount, 0.25);
    }

    #[test]
    fn shared_setter_clamps() {
        let shared = SharedSettings::default();
        shared.set_pitch_semitones(-30.0);
        assert_eq!(shared.snapshot().pitch_semitones, PITCH_MIN);
    }

    #[test]
    fn block_duration() {
        let cfg = EngineConfig::default();
        assert!((cfg.block_duration_ms() - 23.219954).abs() < 1e-3);
    }
}
