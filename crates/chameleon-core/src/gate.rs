//! Peak-relative noise gate.

/// Zeroes samples that fall below a fraction of the buffer's peak.
///
/// The gate has no attack, release or hold: each call looks at one buffer in
/// isolation. With a silent buffer the threshold falls back to the raw
/// fraction, so an all-zero input stays all-zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseGate;

impl NoiseGate {
    /// Effective gate level for `samples` at `threshold_fraction`.
    pub fn threshold(samples: &[f32], threshold_fraction: f32) -> f32 {
        let peak = crate::buffer::peak(samples);
        if peak > 0.0 {
            threshold_fraction * peak
        } else {
            threshold_fraction
        }
    }

    /// Returns a copy of `samples` with every `|x| < threshold` set to zero.
    pub fn apply(samples: &[f32], threshold_fraction: f32) -> Vec<f32> {
        let threshold = Self::threshold(samples, threshold_fraction);
        samples
            .iter()
            .map(|&x| if x.abs() < threshold { 0.0 } else { x })
            .collect()
    }
}
