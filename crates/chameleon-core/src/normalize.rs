//! Output gain and clip-safe peak clamp.

use crate::buffer::peak;

/// Peak level [`Normalizer::finalize`] clamps to.
pub const PEAK_CEILING: f32 = 0.99;

/// Volume scaling and final peak normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Multiplies every sample by `volume` in place.
    pub fn apply_volume(samples: &mut [f32], volume: f32) {
        for s in samples.iter_mut() {
            *s *= volume;
        }
    }

    /// Rescales `samples` so the peak is exactly [`PEAK_CEILING`] when it
    /// currently exceeds it. Buffers already at or below the ceiling are left
    /// untouched, which makes the operation idempotent.
    pub fn finalize(samples: &mut [f32]) {
        let p = peak(samples);
        if p > PEAK_CEILING {
            // Divide first so the peak sample lands on the ceiling exactly.
            for s in samples.iter_mut() {
                *s = *s / p * PEAK_CEILING;
            }
        }
    }
}
