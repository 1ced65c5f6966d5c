//! The fixed-order effect chain shared by streaming and offline processing.
//!
//! ```text
//! gate → low cut → high cut → pitch → echo → reverb → volume → finalize
//! ```
//!
//! Stages whose setting is zero (gate, pitch, echo, reverb) or disabled
//! (filters) are skipped. Volume and the peak clamp always run.
//!
//! Offline callers want progress and cancellation between stages, so
//! [`EffectChain::run_observed`] reports a [`Checkpoint`] at each boundary
//! and stops as soon as the observer breaks. Streaming callers use
//! [`EffectChain::run`], which never stops early. Either way the chain never
//! logs or blocks, so it is safe to call from an audio callback.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::delay::DelayEffects;
use crate::error::{EffectError, Result};
use crate::filter::{FilterBank, FilterCoefficients};
use crate::gate::NoiseGate;
use crate::normalize::Normalizer;
use crate::pitch::PitchShifter;
use crate::settings::{EffectSettings, EngineConfig};

/// Stage boundaries reported by [`EffectChain::run_observed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// Input accepted, nothing applied yet.
    PreEffects,
    /// Gate and filters done.
    PostFilter,
    /// Pitch shift done, echo and reverb next.
    PreDelay,
    /// Volume applied, peak clamp next.
    PreFinalize,
}

impl Checkpoint {
    /// Every checkpoint in the order a run reaches them.
    pub const ALL: [Checkpoint; 4] = [
        Checkpoint::PreEffects,
        Checkpoint::PostFilter,
        Checkpoint::PreDelay,
        Checkpoint::PreFinalize,
    ];

    /// Fraction of an offline job completed when this checkpoint is reached.
    pub fn progress(self) -> f32 {
        match self {
            Checkpoint::PreEffects => 0.3,
            Checkpoint::PostFilter => 0.5,
            Checkpoint::PreDelay => 0.7,
            Checkpoint::PreFinalize => 0.9,
        }
    }

    /// Whether an offline job polls its cancel flag here.
    pub fn checks_cancellation(self) -> bool {
        matches!(self, Checkpoint::PostFilter | Checkpoint::PreDelay)
    }

    /// Human-readable description of the work that follows.
    pub fn label(self) -> &'static str {
        match self {
            Checkpoint::PreEffects => "Applying noise gate and filters",
            Checkpoint::PostFilter => "Shifting pitch",
            Checkpoint::PreDelay => "Adding echo and reverb",
            Checkpoint::PreFinalize => "Normalizing output",
        }
    }
}

/// Composes every stage in a fixed order at one sample rate.
///
/// Construction designs the filters and plans the FFTs; after that the chain
/// is immutable and `Sync`, so one instance can be shared through an `Arc`
/// between the audio callback and any number of offline workers.
#[derive(Debug)]
pub struct EffectChain {
    config: EngineConfig,
    filters: Arc<FilterCoefficients>,
    pitch: PitchShifter,
}

impl EffectChain {
    /// Builds a chain for `config`, designing fresh filter coefficients.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let filters = Arc::new(FilterBank::build(config.sample_rate)?);
        Self::with_coefficients(config, filters)
    }

    /// Builds a chain around coefficients designed elsewhere.
    ///
    /// Fails with [`EffectError::SampleRateMismatch`] when the coefficients
    /// were designed for a different rate.
    pub fn with_coefficients(config: EngineConfig, filters: Arc<FilterCoefficients>) -> Result<Self> {
        if filters.sample_rate != config.sample_rate {
            return Err(EffectError::SampleRateMismatch {
                expected: config.sample_rate,
                actual: filters.sample_rate,
            });
        }
        Ok(Self {
            config,
            filters,
            pitch: PitchShifter::new(),
        })
    }

    /// Engine configuration this chain was built with.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Sample rate every input is assumed to have.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Shared filter coefficients.
    pub fn coefficients(&self) -> &Arc<FilterCoefficients> {
        &self.filters
    }

    /// Runs the whole chain on `samples`.
    ///
    /// The output has the same length as the input.
    pub fn run(&self, samples: &[f32], settings: &EffectSettings) -> Result<Vec<f32>> {
        let out = self.run_observed(samples, settings, |_| ControlFlow::Continue(()))?;
        Ok(out.unwrap_or_default())
    }

    /// Runs the chain, reporting each [`Checkpoint`] to `observer`.
    ///
    /// Returns `Ok(None)` when the observer breaks. Settings are sanitized
    /// before use.
    pub fn run_observed(
        &self,
        samples: &[f32],
        settings: &EffectSettings,
        mut observer: impl FnMut(Checkpoint) -> ControlFlow<()>,
    ) -> Result<Option<Vec<f32>>> {
        let s = settings.sanitized();
        let sample_rate = self.config.sample_rate;

        if observer(Checkpoint::PreEffects).is_break() {
            return Ok(None);
        }

        let gated = if s.gate_threshold > 0.0 {
            NoiseGate::apply(samples, s.gate_threshold)
        } else {
            samples.to_vec()
        };
        let mut out = FilterBank::apply(&gated, &self.filters, s.low_cut_enabled, s.high_cut_enabled);

        if observer(Checkpoint::PostFilter).is_break() {
            return Ok(None);
        }

        if s.pitch_semitones != 0.0 {
            out = self.pitch.apply(&out, sample_rate, s.pitch_semitones)?;
        }

        if observer(Checkpoint::PreDelay).is_break() {
            return Ok(None);
        }

        if s.echo_amount > 0.0 {
            out = DelayEffects::echo(&out, sample_rate, s.echo_amount);
        }
        if s.reverb_amount > 0.0 {
            out = DelayEffects::reverb(&out, sample_rate, s.reverb_amount);
        }
        Normalizer::apply_volume(&mut out, s.volume);

        if observer(Checkpoint::PreFinalize).is_break() {
            return Ok(None);
        }

        Normalizer::finalize(&mut out);
        Ok(Some(out))
    }

    /// Runs the chain on a tagged buffer, checking its sample rate first.
    pub fn process_buffer(&self, buffer: &AudioBuffer, settings: &EffectSettings) -> Result<AudioBuffer> {
        if buffer.sample_rate != self.config.sample_rate {
            return Err(EffectError::SampleRateMismatch {
                expected: self.config.sample_rate,
                actual: buffer.sample_rate,
            });
        }
        let samples = self.run(&buffer.samples, settings)?;
        Ok(AudioBuffer::new(samples, buffer.sample_rate))
    }
}
