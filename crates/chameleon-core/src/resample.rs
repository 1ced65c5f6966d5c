//! Linear-interpolation resampling.
//!
//! Used in two places: to bring loaded audio to the engine rate, and by the
//! pitch shifter to squeeze a time-stretched signal back to its original
//! length. Linear interpolation is cheap and deterministic; it does not
//! band-limit, so large downsampling ratios alias.

/// Reads `samples` at fractional position `pos` by linear interpolation.
///
/// Positions past the last sample hold the last value; an empty slice reads
/// as silence.
#[inline]
pub fn read_linear(samples: &[f32], pos: f64) -> f32 {
    let Some(&last) = samples.last() else {
        return 0.0;
    };
    if pos <= 0.0 {
        return samples[0];
    }
    let i0 = pos.floor() as usize;
    if i0 + 1 >= samples.len() {
        return last;
    }
    let frac = (pos - i0 as f64) as f32;
    samples[i0] + (samples[i0 + 1] - samples[i0]) * frac
}

/// Produces `out_len` samples, reading `samples` at `i · step`.
pub fn stretch_to_length(samples: &[f32], step: f64, out_len: usize) -> Vec<f32> {
    (0..out_len)
        .map(|i| read_linear(samples, i as f64 * step))
        .collect()
}

/// Converts `samples` from `from_rate` to `to_rate`.
///
/// The output length is `round(len · to_rate / from_rate)`. Equal rates (or
/// a zero rate on either side) return a plain copy.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }
    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let out_len = (samples.len() as f64 * ratio).round() as usize;
    stretch_to_length(samples, 1.0 / ratio, out_len)
}
