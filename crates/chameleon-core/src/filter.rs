//! Linear-phase FIR band limiting.
//!
//! Two fixed filters shape the voice band: a 300 Hz high-pass ("low cut")
//! removes rumble and handling noise, a 3 kHz low-pass ("high cut") removes
//! hiss. Both are 101-tap windowed-sinc designs with a Hamming window,
//! normalized for unity gain in their passband (DC for the low-pass, Nyquist
//! for the high-pass).
//!
//! Taps are designed in `f64` and stored as `f32`. They are built once per
//! sample rate and shared through an `Arc` by every chain of the session.
//!
//! Filtering is causal direct-form convolution with zero initial state:
//!
//! ```text
//! y[n] = Σ_{k=0}^{N-1} b[k] · x[n-k]     (x[i] = 0 for i < 0)
//! ```
//!
//! so each call is independent and introduces the filter's group delay of
//! `(N-1)/2` samples.

use std::f64::consts::PI;

use crate::error::{EffectError, Result};

/// Number of taps in both filters.
pub const FILTER_TAPS: usize = 101;
/// High-pass cutoff in Hz.
pub const LOW_CUT_HZ: f32 = 300.0;
/// Low-pass cutoff in Hz.
pub const HIGH_CUT_HZ: f32 = 3000.0;

/// Which passband a FIR design targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirKind {
    /// Pass frequencies below the cutoff.
    LowPass,
    /// Pass frequencies above the cutoff.
    HighPass,
}

/// An immutable set of FIR taps.
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    taps: Vec<f32>,
}

impl FirFilter {
    /// Designs a windowed-sinc filter with `num_taps` taps.
    ///
    /// `num_taps` must be odd for the high-pass (an even-length type II
    /// filter has a forced zero at Nyquist). The cutoff must lie strictly
    /// between 0 and `sample_rate / 2`.
    pub fn design(kind: FirKind, num_taps: usize, cutoff_hz: f32, sample_rate: u32) -> Result<Self> {
        let nyquist = f64::from(sample_rate) / 2.0;
        let cutoff = f64::from(cutoff_hz);
        if sample_rate == 0 || cutoff <= 0.0 || cutoff >= nyquist {
            return Err(EffectError::InvalidSampleRate {
                sample_rate,
                reason: "filter cutoff must lie below the Nyquist frequency",
            });
        }
        debug_assert!(num_taps % 2 == 1, "odd tap count required");

        let c = cutoff / nyquist;
        let center = (num_taps - 1) as f64 / 2.0;
        let mut h: Vec<f64> = (0..num_taps)
            .map(|n| {
                let m = n as f64 - center;
                let lowpass = c * sinc(c * m);
                let ideal = match kind {
                    FirKind::LowPass => lowpass,
                    FirKind::HighPass => sinc(m) - lowpass,
                };
                ideal * hamming(n, num_taps)
            })
            .collect();

        // Unity gain at DC (low-pass) or Nyquist (high-pass).
        let gain: f64 = match kind {
            FirKind::LowPass => h.iter().sum(),
            FirKind::HighPass => h
                .iter()
                .enumerate()
                .map(|(n, &v)| v * (PI * (n as f64 - center)).cos())
                .sum(),
        };
        for v in &mut h {
            *v /= gain;
        }

        Ok(Self {
            taps: h.into_iter().map(|v| v as f32).collect(),
        })
    }

    /// The filter taps.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Causal convolution of `input` with the taps, zero initial state.
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let taps = &self.taps;
        (0..input.len())
            .map(|n| {
                let reach = taps.len().min(n + 1);
                taps[..reach]
                    .iter()
                    .enumerate()
                    .map(|(k, &b)| b * input[n - k])
                    .sum()
            })
            .collect()
    }
}

/// Normalized sinc, `sin(πx) / (πx)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Symmetric Hamming window value for index `n` of `len`.
fn hamming(n: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    0.54 - 0.46 * (2.0 * PI * n as f64 / (len - 1) as f64).cos()
}

/// Low-cut and high-cut taps for one sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    /// Sample rate the taps were designed for.
    pub sample_rate: u32,
    /// 300 Hz high-pass.
    pub low_cut: FirFilter,
    /// 3 kHz low-pass.
    pub high_cut: FirFilter,
}

/// Builds and applies the voice-band filter pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBank;

impl FilterBank {
    /// Designs both filters for `sample_rate`.
    ///
    /// Fails with [`EffectError::InvalidSampleRate`] when the Nyquist
    /// frequency does not exceed the 3 kHz high-cut.
    pub fn build(sample_rate: u32) -> Result<FilterCoefficients> {
        if f64::from(HIGH_CUT_HZ) >= f64::from(sample_rate) / 2.0 {
            return Err(EffectError::InvalidSampleRate {
                sample_rate,
                reason: "Nyquist frequency must exceed the 3 kHz high-cut",
            });
        }
        let low_cut = FirFilter::design(FirKind::HighPass, FILTER_TAPS, LOW_CUT_HZ, sample_rate)?;
        let high_cut = FirFilter::design(FirKind::LowPass, FILTER_TAPS, HIGH_CUT_HZ, sample_rate)?;
        tracing::debug!(sample_rate, taps = FILTER_TAPS, "designed voice-band filters");
        Ok(FilterCoefficients {
            sample_rate,
            low_cut,
            high_cut,
        })
    }

    /// Filters a copy of `input`: low cut first, then high cut.
    ///
    /// With both filters disabled the input is returned unchanged.
    pub fn apply(
        input: &[f32],
        coefficients: &FilterCoefficients,
        use_low_cut: bool,
        use_high_cut: bool,
    ) -> Vec<f32> {
        let mut out = if use_low_cut {
            coefficients.low_cut.apply(input)
        } else {
            input.to_vec()
        };
        if use_high_cut {
            out = coefficients.high_cut.apply(&out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn taps_are_symmetric() {
        let coeffs = FilterBank::build(44100).unwrap();
        for filter in [&coeffs.low_cut, &coeffs.high_cut] {
            let t = filter.taps();
            assert_eq!(t.len(), FILTER_TAPS);
            for i in 0..t.len() {
                assert!((t[i] - t[t.len() - 1 - i]).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn lowpass_unity_at_dc() {
        let coeffs = FilterBank::build(44100).unwrap();
        let dc: f32 = coeffs.high_cut.taps().iter().sum();
        assert!((dc - 1.0).abs() < 1e-5, "DC gain {dc}");
    }

    #[test]
    fn highpass_unity_at_nyquist() {
        let coeffs = FilterBank::build(44100).unwrap();
        let nyq: f32 = coeffs
            .low_cut
            .taps()
            .iter()
            .enumerate()
            .map(|(n, &b)| if n % 2 == 0 { b } else { -b })
            .sum();
        assert!((nyq - 1.0).abs() < 1e-5, "Nyquist gain {nyq}");

        // 101 taps cannot reach deep attenuation at 300 Hz; DC is still well down.
        let dc: f32 = coeffs.low_cut.taps().iter().sum();
        assert!(dc.abs() < 0.5, "DC gain {dc}");
    }

    #[test]
    fn passband_and_stopband() {
        let sr = 44100;
        let coeffs = FilterBank::build(sr).unwrap();

        let voice = sine(1000.0, sr, 8192);
        let out = FilterBank::apply(&voice, &coeffs, true, true);
        let ratio = rms(&out[FILTER_TAPS * 2..]) / rms(&voice[FILTER_TAPS * 2..]);
        assert!(ratio > 0.85 && ratio < 1.1, "1 kHz passband ratio {ratio}");

        let hiss = sine(10_000.0, sr, 8192);
        let out = FilterBank::apply(&hiss, &coeffs, false, true);
        let ratio = rms(&out[FILTER_TAPS * 2..]) / rms(&hiss[FILTER_TAPS * 2..]);
        assert!(ratio < 0.05, "10 kHz should be cut, ratio {ratio}");
    }

    #[test]
    fn disabled_filters_copy_input() {
        let coeffs = FilterBank::build(48000).unwrap();
        let x = vec![0.3, -0.2, 0.1];
        assert_eq!(FilterBank::apply(&x, &coeffs, false, false), x);
    }

    #[test]
    fn impulse_response_equals_taps() {
        let coeffs = FilterBank::build(44100).unwrap();
        let mut impulse = vec![0.0; FILTER_TAPS + 10];
        impulse[0] = 1.0;
        let out = coeffs.high_cut.apply(&impulse);
        assert_eq!(&out[..FILTER_TAPS], coeffs.high_cut.taps());
        assert!(out[FILTER_TAPS..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rejects_low_sample_rate() {
        assert!(matches!(
            FilterBank::build(6000),
            Err(EffectError::InvalidSampleRate { sample_rate: 6000, .. })
        ));
        assert!(FilterBank::build(0).is_err());
        assert!(FilterBank::build(8000).is_ok());
    }
}
