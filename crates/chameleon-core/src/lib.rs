//! Chameleon Core - the voice effect pipeline
//!
//! This crate holds every signal transform the engine applies to a buffer,
//! plus the [`EffectChain`] that composes them. Both execution modes (the
//! real-time stream adapter and the offline file renderer in `chameleon-io`)
//! call the same chain, so a live preview and a rendered file go through an
//! identical sequence of stages.
//!
//! # Stages
//!
//! Applied in this fixed order by [`EffectChain::run`]:
//!
//! 1. [`NoiseGate`] - zero samples below a peak-relative threshold
//! 2. [`FilterBank`] - 101-tap FIR low-cut (300 Hz) and high-cut (3 kHz)
//! 3. [`PitchShifter`] - phase-vocoder pitch shift, duration preserving
//! 4. [`DelayEffects::echo`] - single 200 ms echo
//! 5. [`DelayEffects::reverb`] - four exponentially decaying 100 ms taps
//! 6. [`Normalizer::apply_volume`] - output gain
//! 7. [`Normalizer::finalize`] - peak clamp to 0.99
//!
//! # Settings
//!
//! - [`EffectSettings`] - `Copy` snapshot of every user-facing parameter
//! - [`SharedSettings`] - lock-free handle the control surface writes and the
//!   audio thread snapshots
//! - [`EngineConfig`] - sample rate and block size threaded through construction
//!
//! # Example
//!
//! ```rust
//! use chameleon_core::{EffectChain, EffectSettings, EngineConfig};
//!
//! let chain = EffectChain::new(EngineConfig::default()).unwrap();
//! let settings = EffectSettings {
//!     pitch_semitones: 3.0,
//!     echo_amount: 0.4,
//!     ..EffectSettings::default()
//! };
//!
//! let input: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
//! let output = chain.run(&input, &settings).unwrap();
//! assert_eq!(output.len(), input.len());
//! ```

pub mod analysis;
pub mod buffer;
pub mod chain;
pub mod delay;
pub mod error;
pub mod filter;
pub mod gate;
pub mod normalize;
pub mod pitch;
pub mod resample;
pub mod settings;

pub use analysis::{SignalStats, detect_pitch};
pub use buffer::{AudioBuffer, peak};
pub use chain::{Checkpoint, EffectChain};
pub use delay::DelayEffects;
pub use error::{EffectError, Result};
pub use filter::{FilterBank, FilterCoefficients, FirFilter};
pub use gate::NoiseGate;
pub use normalize::{Normalizer, PEAK_CEILING};
pub use pitch::PitchShifter;
pub use resample::resample_linear;
pub use settings::{EffectSettings, EngineConfig, SharedSettings};
