//! WAV file reading and writing.
//!
//! Everything past this module works on mono [`AudioBuffer`]s, so reading
//! mixes channels down by averaging and [`load_audio`] additionally brings
//! the samples to the engine's rate.

use std::path::Path;

use chameleon_core::{AudioBuffer, resample_linear};
use hound::{SampleFormat, WavReader, WavWriter};
use serde::Serialize;

use crate::{Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone, Serialize)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Reads WAV metadata without decoding samples.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));
    let duration_secs = if spec.sample_rate == 0 {
        0.0
    } else {
        num_frames as f64 / f64::from(spec.sample_rate)
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format: match spec.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// Output file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth: 16 or 24 for PCM, 32 for float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: chameleon_core::settings::DEFAULT_SAMPLE_RATE,
            bits_per_sample: 16,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Reads a WAV file as mono `f32` samples plus its original spec.
///
/// Integer formats are scaled into `[-1, 1)`; multi-channel files are
/// averaged down to one channel.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let path = path.as_ref();
    let load_err = |source| Error::Load {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(load_err)?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(load_err)?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(load_err)?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec))
}

/// Loads `path` as a mono buffer at `target_rate`.
///
/// Files recorded at another rate are resampled on load.
pub fn load_audio<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let (samples, spec) = read_wav(path)?;
    if spec.sample_rate == target_rate {
        return Ok(AudioBuffer::new(samples, target_rate));
    }
    tracing::debug!(
        path = %path.display(),
        from = spec.sample_rate,
        to = target_rate,
        "resampling on load"
    );
    Ok(AudioBuffer::new(
        resample_linear(&samples, spec.sample_rate, target_rate),
        target_rate,
    ))
}

/// Writes `samples` to `path` using `spec`.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    if !matches!(spec.bits_per_sample, 16 | 24 | 32) {
        return Err(Error::UnsupportedBitDepth(spec.bits_per_sample));
    }
    let path = path.as_ref();
    let save_err = |source| Error::Save {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec)).map_err(save_err)?;
    let channels = usize::from(spec.channels.max(1));

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            for _ in 0..channels {
                writer.write_sample(sample).map_err(save_err)?;
            }
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            for _ in 0..channels {
                writer.write_sample(int_sample).map_err(save_err)?;
            }
        }
    }

    writer.finalize().map_err(save_err)
}

/// Saves a mono buffer at its own sample rate with the given bit depth.
pub fn save_audio<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, bits_per_sample: u16) -> Result<()> {
    write_wav(
        path,
        &buffer.samples,
        WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate,
            bits_per_sample,
        },
    )
}
