//! Mono sample buffer tagged with its sample rate.

use serde::{Deserialize, Serialize};

/// A mono block of `f32` samples at a known sample rate.
///
/// Samples nominally lie in `[-1.0, 1.0]`. Multi-channel data is mixed down
/// before it becomes an `AudioBuffer` and duplicated again only at the
/// transport boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    /// Mono samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Wraps `samples` recorded at `sample_rate`.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds. Zero for a zero sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value, `0.0` when empty.
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }
}

/// Largest absolute value in `samples`, `0.0` for an empty slice.
#[inline]
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_of_empty_is_zero() {
        assert_eq!(peak(&[]), 0.0);
    }

    #[test]
    fn peak_uses_absolute_value() {
        assert_eq!(peak(&[0.1, -0.8, 0.5]), 0.8);
    }

    #[test]
    fn duration_matches_rate() {
        let buf = AudioBuffer::new(vec![0.0; 22050], 44100);
        assert!((buf.duration_secs() - 0.5).abs() < 1e-9);
        assert_eq!(AudioBuffer::new(vec![0.0; 10], 0).duration_secs(), 0.0);
    }
}
