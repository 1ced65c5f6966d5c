//! Offline signal inspection: amplitude statistics and dominant pitch.

use std::f32::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Lowest frequency considered by [`detect_pitch`].
pub const PITCH_FMIN: f32 = 150.0;
/// Highest frequency considered by [`detect_pitch`].
pub const PITCH_FMAX: f32 = 4000.0;

const PITCH_FFT_SIZE: usize = 2048;
const PITCH_HOP: usize = 512;
/// Frames whose peak is below this fraction of the loudest frame are unvoiced.
const VOICED_THRESHOLD: f32 = 0.1;

/// Absolute-amplitude statistics of a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    /// Largest `|x|`.
    pub max_amplitude: f32,
    /// Smallest `|x|`.
    pub min_amplitude: f32,
    /// Mean of `|x|`.
    pub mean_amplitude: f32,
    /// Root mean square.
    pub rms: f32,
}

impl SignalStats {
    /// Computes statistics over `samples`. All zero for an empty slice.
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut max = 0.0_f32;
        let mut min = f32::INFINITY;
        let mut sum = 0.0_f64;
        let mut sum_sq = 0.0_f64;
        for &x in samples {
            let a = x.abs();
            max = max.max(a);
            min = min.min(a);
            sum += f64::from(a);
            sum_sq += f64::from(x) * f64::from(x);
        }
        let n = samples.len() as f64;
        Self {
            max_amplitude: max,
            min_amplitude: min,
            mean_amplitude: (sum / n) as f32,
            rms: (sum_sq / n).sqrt() as f32,
        }
    }
}

/// Estimates the dominant pitch of `samples` in Hz.
///
/// Each Hann-windowed frame contributes the frequency of its strongest bin
/// between [`PITCH_FMIN`] and [`PITCH_FMAX`], refined by parabolic
/// interpolation. Frames whose peak is under a tenth of the loudest frame's
/// peak are treated as unvoiced. Returns `None` when no frame is voiced.
pub fn detect_pitch(samples: &[f32], sample_rate: u32) -> Option<f32> {
    if samples.is_empty() || sample_rate == 0 {
        return None;
    }
    let sr = sample_rate as f32;
    let n_fft = PITCH_FFT_SIZE;
    let bin_hz = sr / n_fft as f32;
    let lo = ((PITCH_FMIN / bin_hz).ceil() as usize).max(1);
    let hi = ((PITCH_FMAX / bin_hz).floor() as usize).min(n_fft / 2 - 1);
    if lo >= hi {
        return None;
    }

    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let window: Vec<f32> = (0..n_fft)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / n_fft as f32).cos())
        .collect();
    let mut buf = vec![Complex32::default(); n_fft];

    // (peak magnitude, refined frequency) per frame
    let mut peaks = Vec::new();
    let mut start = 0;
    loop {
        for (i, (dst, &w)) in buf.iter_mut().zip(&window).enumerate() {
            let x = samples.get(start + i).copied().unwrap_or(0.0);
            *dst = Complex32::new(x * w, 0.0);
        }
        fft.process(&mut buf);

        let mags: Vec<f32> = buf[..=n_fft / 2].iter().map(|c| c.norm()).collect();
        let (k, &peak) = mags[lo..=hi]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, m)| (i + lo, m))?;
        if peak > 0.0 {
            let (a, b, c) = (mags[k - 1], mags[k], mags[k + 1]);
            let denom = a - 2.0 * b + c;
            let offset = if denom.abs() > f32::EPSILON {
                (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            peaks.push((peak, (k as f32 + offset) * bin_hz));
        }

        start += PITCH_HOP;
        if start >= samples.len() {
            break;
        }
    }

    let loudest = peaks.iter().map(|p| p.0).fold(0.0_f32, f32::max);
    let voiced: Vec<f32> = peaks
        .iter()
        .filter(|p| p.0 >= loudest * VOICED_THRESHOLD)
        .map(|p| p.1)
        .collect();
    if voiced.is_empty() {
        None
    } else {
        Some(voiced.iter().sum::<f32>() / voiced.len() as f32)
    }
}
