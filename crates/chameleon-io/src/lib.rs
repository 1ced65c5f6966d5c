//! Audio I/O and execution modes for the chameleon effect engine.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`load_audio`] and [`save_audio`] (mono mix-down,
//!   resampling to the engine rate, 16/24/32-bit output)
//! - **File inspection**: [`inspect`] for duration, format, amplitude
//!   statistics and dominant pitch
//! - **Real-time streaming**: [`RealTimeStreamAdapter`] runs the chain once per
//!   transport block, [`AudioStream`] drives it from a cpal duplex stream
//! - **Offline processing**: [`ProcessingTask`] tracks one cancellable job,
//!   [`OfflineProcessor`] renders files or buffers on a worker thread
//! - **Batch processing**: [`BatchProcessor`] renders many files in sequence,
//!   isolating per-file failures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chameleon_core::{EffectChain, EffectSettings, EngineConfig};
//! use chameleon_io::{OfflineProcessor, ProcessingTask, TaskState, save_audio};
//!
//! let chain = Arc::new(EffectChain::new(EngineConfig::default())?);
//! let offline = OfflineProcessor::new(chain);
//!
//! let task = ProcessingTask::new();
//! offline.render_file("voice.wav", &EffectSettings::default(), &task);
//! if task.state() == TaskState::Completed {
//!     let buffer = task.take_result().unwrap();
//!     save_audio("voice_processed.wav", &buffer, 16)?;
//! }
//! ```

mod adapter;
mod batch;
mod info;
mod offline;
mod stream;
mod task;
mod wav;

use std::path::PathBuf;

use chameleon_core::EffectError;

pub use adapter::{EVENT_CAPACITY, RealTimeStreamAdapter, StreamEvent, StreamMonitor, StreamStatus};
pub use batch::{BatchFailure, BatchJob, BatchProcessor, BatchProgress, BatchReport, output_path_for};
pub use info::{AudioFileInfo, inspect};
pub use offline::{OfflineProcessor, TaskHandle};
pub use stream::{
    AudioDevice, AudioStream, StreamConfig, default_device, find_device_by_index, list_devices,
};
pub use task::{ProcessingTask, TaskState};
pub use wav::{
    WavFormat, WavInfo, WavSpec, load_audio, read_wav, read_wav_info, save_audio, write_wav,
};

/// Error types for audio I/O and processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source file could not be opened or decoded.
    #[error("failed to load {}: {source}", path.display())]
    Load {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: hound::Error,
    },

    /// A destination file could not be written.
    #[error("failed to save {}: {source}", path.display())]
    Save {
        /// File that failed to save.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: hound::Error,
    },

    /// An effect stage failed.
    #[error(transparent)]
    Effect(#[from] EffectError),

    /// Output bit depth other than 16, 24 or 32.
    #[error("unsupported bit depth {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
