//! Echo and reverb built from fixed feed-forward taps.
//!
//! Neither effect keeps state between calls: the delayed signal is taken from
//! the same buffer, so a tail never spills into the next one.
//!
//! | Effect | Delay | Taps | Gain per tap |
//! |--------|-------|------|--------------|
//! | Echo | 200 ms | 1 | `0.5 · strength` |
//! | Reverb | 100 ms | 4 | `amount · 0.7^i` |

/// Echo delay in seconds.
pub const ECHO_DELAY_SECS: f32 = 0.2;
/// Reverb tap spacing in seconds.
pub const REVERB_DELAY_SECS: f32 = 0.1;
/// Number of reverb taps.
pub const REVERB_TAPS: usize = 4;
/// Per-tap reverb decay.
pub const REVERB_DECAY: f32 = 0.7;

/// Delay-based effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayEffects;

impl DelayEffects {
    /// Echo delay in samples for `sample_rate`.
    pub fn echo_delay_samples(sample_rate: u32) -> usize {
        (ECHO_DELAY_SECS * sample_rate as f32) as usize
    }

    /// Reverb tap spacing in samples for `sample_rate`.
    pub fn reverb_delay_samples(sample_rate: u32) -> usize {
        (REVERB_DELAY_SECS * sample_rate as f32) as usize
    }

    /// Adds one copy of the signal delayed by 200 ms at `0.5 · strength`.
    ///
    /// The sum is formed over `len + delay` samples and rescaled by that
    /// padded result's peak (when nonzero) before truncating back to the
    /// input length. Buffers no longer than the delay come back unchanged.
    pub fn echo(samples: &[f32], sample_rate: u32, strength: f32) -> Vec<f32> {
        let delay = Self::echo_delay_samples(sample_rate);
        let len = samples.len();
        if len <= delay {
            return samples.to_vec();
        }

        let decay = 0.5 * strength;
        let mut padded = vec![0.0_f32; len + delay];
        padded[..len].copy_from_slice(samples);
        for (i, &x) in samples.iter().enumerate() {
            padded[i + delay] += decay * x;
        }

        let p = crate::buffer::peak(&padded);
        padded.truncate(len);
        if p > 0.0 {
            for s in &mut padded {
                *s /= p;
            }
        }
        padded
    }

    /// Adds four taps spaced 100 ms apart, tap `i` scaled by
    /// `amount · 0.7^i`. Taps past the end of the buffer are dropped.
    ///
    /// The result is rescaled by its peak only when that peak exceeds 1.0.
    pub fn reverb(samples: &[f32], sample_rate: u32, amount: f32) -> Vec<f32> {
        let delay = Self::reverb_delay_samples(sample_rate);
        let len = samples.len();
        let mut out = samples.to_vec();

        let mut gain = amount;
        for i in 1..=REVERB_TAPS {
            gain *= REVERB_DECAY;
            let pos = i * delay;
            if pos >= len {
                break;
            }
            for (dst, &src) in out[pos..].iter_mut().zip(&samples[..len - pos]) {
                *dst += src * gain;
            }
        }

        let p = crate::buffer::peak(&out);
        if p > 1.0 {
            for s in &mut out {
                *s /= p;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 1000;

    #[test]
    fn delay_lengths() {
        assert_eq!(DelayEffects::echo_delay_samples(44100), 8820);
        assert_eq!(DelayEffects::reverb_delay_samples(44100), 4410);
        assert_eq!(DelayEffects::echo_delay_samples(SR), 200);
    }

    #[test]
    fn echo_short_buffer_unchanged() {
        let x = vec![0.5; 200];
        assert_eq!(DelayEffects::echo(&x, SR, 1.0), x);
    }

    #[test]
    fn echo_places_delayed_copy() {
        let mut x = vec![0.0; 400];
        x[0] = 1.0;
        let out = DelayEffects::echo(&x, SR, 1.0);
        assert_eq!(out.len(), 400);
        // Padded peak is the original impulse, so no scaling.
        assert_eq!(out[0], 1.0);
        assert_eq!(out[200], 0.5);
    }

    #[test]
    fn echo_normalizes_by_padded_peak() {
        let x = vec![0.4; 300];
        let out = DelayEffects::echo(&x, SR, 1.0);
        // Overlap region reaches 0.4 + 0.2 = 0.6, which becomes 1.0.
        assert!((out[250] - 1.0).abs() < 1e-6);
        assert!((out[0] - 0.4 / 0.6).abs() < 1e-6);
    }

    #[test]
    fn reverb_taps_decay() {
        let mut x = vec![0.0; 500];
        x[0] = 0.5;
        let out = DelayEffects::reverb(&x, SR, 1.0);
        assert_eq!(out[0], 0.5);
        assert!((out[100] - 0.5 * 0.7).abs() < 1e-6);
        assert!((out[200] - 0.5 * 0.49).abs() < 1e-6);
        assert!((out[400] - 0.5 * 0.7_f32.powi(4)).abs() < 1e-6);
    }

    #[test]
    fn reverb_drops_taps_past_end() {
        let x = vec![0.1; 150];
        let out = DelayEffects::reverb(&x, SR, 1.0);
        assert_eq!(out.len(), 150);
        assert_eq!(out[99], 0.1);
        assert!((out[100] - 0.17).abs() < 1e-6);
    }

    #[test]
    fn reverb_rescales_above_unity() {
        let x = vec![0.9; 300];
        let out = DelayEffects::reverb(&x, SR, 1.0);
        let p = crate::buffer::peak(&out);
        assert!((p - 1.0).abs() < 1e-6);
    }
}
