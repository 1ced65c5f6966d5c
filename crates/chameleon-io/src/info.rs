//! File inspection for the `info` command.

use std::path::{Path, PathBuf};

use chameleon_core::{SignalStats, detect_pitch};
use serde::Serialize;

use crate::Result;
use crate::wav::{WavFormat, read_wav, read_wav_info};

/// Everything `chameleon info` reports about a file.
#[derive(Debug, Clone, Serialize)]
pub struct AudioFileInfo {
    /// The inspected file.
    pub path: PathBuf,
    /// Container and encoding, e.g. `WAV PCM 16-bit`.
    pub format: String,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Frames per channel.
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Size on disk in bytes.
    pub file_size_bytes: u64,
    /// Amplitude statistics of the mono mix.
    pub stats: SignalStats,
    /// Dominant pitch in Hz, when requested and found.
    pub pitch_hz: Option<f32>,
}

/// Reads header, size and amplitude statistics of `path`.
///
/// Pitch detection decodes and analyzes the whole file, so it only runs when
/// `detect` is set.
pub fn inspect(path: &Path, detect: bool) -> Result<AudioFileInfo> {
    let header = read_wav_info(path)?;
    let file_size_bytes = std::fs::metadata(path)?.len();
    let (samples, _) = read_wav(path)?;

    let encoding = match header.format {
        WavFormat::Pcm => "PCM",
        WavFormat::IeeeFloat => "float",
    };

    Ok(AudioFileInfo {
        path: path.to_path_buf(),
        format: format!("WAV {encoding} {}-bit", header.bits_per_sample),
        sample_rate: header.sample_rate,
        channels: header.channels,
        bits_per_sample: header.bits_per_sample,
        num_frames: header.num_frames,
        duration_secs: header.duration_secs,
        file_size_bytes,
        stats: SignalStats::measure(&samples),
        pitch_hz: if detect {
            detect_pitch(&samples, header.sample_rate)
        } else {
            None
        },
    })
}
