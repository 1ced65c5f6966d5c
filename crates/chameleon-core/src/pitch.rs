//! Duration-preserving pitch shift by phase vocoder.
//!
//! A shift of `s` semitones is done in two steps:
//!
//! 1. Time-stretch the signal by `rate = 2^(-s/12)` with a phase vocoder,
//!    which changes its duration to `len / rate` without touching pitch.
//! 2. Read the stretched signal back at `1 / rate` samples per output sample,
//!    which restores the original length and moves every frequency by
//!    `2^(s/12)`.
//!
//! # Framing
//!
//! Frames are `n_fft = 2048` samples with a periodic Hann window and a hop of
//! `n_fft / 4`. The signal is zero-padded by `n_fft / 2` on both sides so the
//! first frame is centered on sample 0. For buffers shorter than 2048 the
//! window is halved until it fits, but never below 64; very short buffers are
//! therefore padded rather than rejected.
//!
//! # Vocoder
//!
//! For each output time step `t · rate` the magnitudes of the two enclosing
//! analysis frames are linearly interpolated. The phase accumulator starts at
//! the phase of the first frame and advances per bin by the expected advance
//! `2π·k·hop/n_fft` plus the wrapped deviation measured between the two
//! frames. Resynthesis is windowed overlap-add normalized by the summed
//! squared window.

use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::error::{EffectError, Result};
use crate::resample::stretch_to_length;

/// Largest analysis window.
pub const MAX_FFT_SIZE: usize = 2048;
/// Smallest analysis window.
pub const MIN_FFT_SIZE: usize = 64;

const TAU: f32 = 2.0 * PI;

struct FftPair {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

/// Phase-vocoder pitch shifter.
///
/// All FFT plans (64 through 2048 points) are built in [`PitchShifter::new`],
/// so [`PitchShifter::apply`] only reads shared state and one instance can
/// serve any number of threads.
pub struct PitchShifter {
    plans: Vec<FftPair>,
}

impl fmt::Debug for PitchShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PitchShifter")
            .field("fft_sizes", &self.plans.iter().map(|p| p.size).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchShifter {
    /// Plans every FFT size the shifter can use.
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let mut plans = Vec::new();
        let mut size = MIN_FFT_SIZE;
        while size <= MAX_FFT_SIZE {
            plans.push(FftPair {
                size,
                forward: planner.plan_fft_forward(size),
                inverse: planner.plan_fft_inverse(size),
                window: periodic_hann(size),
            });
            size *= 2;
        }
        Self { plans }
    }

    /// Analysis window length used for a buffer of `len` samples.
    pub fn fft_size_for(len: usize) -> usize {
        let mut n_fft = MAX_FFT_SIZE;
        while n_fft > len && n_fft > MIN_FFT_SIZE {
            n_fft /= 2;
        }
        n_fft
    }

    /// Shifts `samples` by `semitones` while keeping their length.
    ///
    /// `sample_rate` only has to be nonzero: the stretch and the read-back
    /// use the same ratio, so the rate cancels out.
    pub fn apply(&self, samples: &[f32], sample_rate: u32, semitones: f32) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(EffectError::EmptyBuffer {
                stage: "pitch shift",
            });
        }
        if !semitones.is_finite() {
            return Err(EffectError::NonFiniteParameter {
                name: "pitch_semitones",
                value: semitones,
            });
        }
        if sample_rate == 0 {
            return Err(EffectError::InvalidSampleRate {
                sample_rate,
                reason: "pitch shift needs a nonzero sample rate",
            });
        }

        let rate = 2.0_f64.powf(-f64::from(semitones) / 12.0);
        let n_fft = Self::fft_size_for(samples.len());
        let plan = self.plan(n_fft);

        let spectrum = stft(samples, plan);
        let stretched_frames = phase_vocoder(&spectrum, rate as f32, n_fft / 4, n_fft);
        let stretched_len = (samples.len() as f64 / rate).round() as usize;
        let stretched = istft(&stretched_frames, plan, stretched_len);

        Ok(stretch_to_length(&stretched, 1.0 / rate, samples.len()))
    }

    fn plan(&self, size: usize) -> &FftPair {
        let index = (size / MIN_FFT_SIZE).trailing_zeros() as usize;
        &self.plans[index.min(self.plans.len() - 1)]
    }
}

/// `0.5 - 0.5·cos(2πn/N)`, the DFT-even Hann window.
fn periodic_hann(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (TAU * n as f32 / size as f32).cos())
        .collect()
}

/// Centered short-time transform. Returns one half-spectrum
/// (`n_fft/2 + 1` bins) per frame.
fn stft(samples: &[f32], plan: &FftPair) -> Vec<Vec<Complex32>> {
    let n_fft = plan.size;
    let hop = n_fft / 4;
    let pad = n_fft / 2;
    let bins = n_fft / 2 + 1;

    let mut padded = vec![0.0_f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_frames = 1 + (padded.len() - n_fft) / hop;
    let mut scratch = vec![Complex32::default(); plan.forward.get_inplace_scratch_len()];
    let mut buf = vec![Complex32::default(); n_fft];

    (0..n_frames)
        .map(|t| {
            let start = t * hop;
            for ((dst, &x), &w) in buf
                .iter_mut()
                .zip(&padded[start..start + n_fft])
                .zip(&plan.window)
            {
                *dst = Complex32::new(x * w, 0.0);
            }
            plan.forward.process_with_scratch(&mut buf, &mut scratch);
            buf[..bins].to_vec()
        })
        .collect()
}

/// Wraps a phase into `[-π, π]`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    phase - TAU * (phase / TAU).round()
}

/// Resamples the frame sequence in time by `rate` (frames per output frame).
fn phase_vocoder(
    frames: &[Vec<Complex32>],
    rate: f32,
    hop: usize,
    n_fft: usize,
) -> Vec<Vec<Complex32>> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let bins = first.len();
    let silent = vec![Complex32::default(); bins];
    let frame_at = |i: usize| frames.get(i).unwrap_or(&silent);

    let phi_advance: Vec<f32> = (0..bins)
        .map(|k| TAU * k as f32 * hop as f32 / n_fft as f32)
        .collect();
    let mut phase_acc: Vec<f32> = first.iter().map(|c| c.arg()).collect();

    let n_out = (frames.len() as f64 / f64::from(rate)).ceil() as usize;
    let mut out = Vec::with_capacity(n_out);
    for t in 0..n_out {
        let step = t as f64 * f64::from(rate);
        let idx = step.floor() as usize;
        let alpha = (step - idx as f64) as f32;
        let left = frame_at(idx);
        let right = frame_at(idx + 1);

        let mut frame = Vec::with_capacity(bins);
        for k in 0..bins {
            let mag = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
            frame.push(Complex32::from_polar(mag, phase_acc[k]));

            let deviation = wrap_phase(right[k].arg() - left[k].arg() - phi_advance[k]);
            // Kept wrapped so high bins do not lose f32 precision.
            phase_acc[k] = wrap_phase(phase_acc[k] + phi_advance[k] + deviation);
        }
        out.push(frame);
    }
    out
}

/// Overlap-add resynthesis, trimmed of the centering pad and fit to `length`.
fn istft(frames: &[Vec<Complex32>], plan: &FftPair, length: usize) -> Vec<f32> {
    let n_fft = plan.size;
    let hop = n_fft / 4;
    let pad = n_fft / 2;

    let max_frames = (length + 2 * pad).div_ceil(hop);
    let n_frames = frames.len().min(max_frames);
    if n_frames == 0 {
        return vec![0.0; length];
    }

    let total = n_fft + hop * (n_frames - 1);
    let mut signal = vec![0.0_f32; total];
    let mut window_sum = vec![0.0_f32; total];
    let mut scratch = vec![Complex32::default(); plan.inverse.get_inplace_scratch_len()];
    let mut buf = vec![Complex32::default(); n_fft];
    let scale = 1.0 / n_fft as f32;

    for (t, half) in frames[..n_frames].iter().enumerate() {
        // Rebuild the Hermitian-symmetric full spectrum.
        buf[..half.len()].copy_from_slice(half);
        for k in 1..n_fft / 2 {
            buf[n_fft - k] = half[k].conj();
        }
        plan.inverse.process_with_scratch(&mut buf, &mut scratch);

        let start = t * hop;
        for (n, (&w, c)) in plan.window.iter().zip(&buf).enumerate() {
            signal[start + n] += c.re * scale * w;
            window_sum[start + n] += w * w;
        }
    }

    for (s, &w) in signal.iter_mut().zip(&window_sum) {
        if w > f32::MIN_POSITIVE {
            *s /= w;
        }
    }

    let mut out: Vec<f32> = signal.into_iter().skip(pad).take(length).collect();
    out.resize(length, 0.0);
    out
}
