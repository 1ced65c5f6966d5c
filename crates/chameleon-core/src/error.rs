//! Error types for the effect pipeline.

/// Errors raised by an effect stage or by chain construction.
///
/// The enum is `Clone` so it can travel through the stream adapter's event
/// channel without allocating on the audio thread.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    /// The sample rate cannot support the fixed filter cutoffs.
    #[error("invalid sample rate {sample_rate} Hz: {reason}")]
    InvalidSampleRate {
        /// Offending sample rate in Hz.
        sample_rate: u32,
        /// Why the rate was rejected.
        reason: &'static str,
    },

    /// A buffer's sample rate differs from the rate the chain was built for.
    #[error("sample rate mismatch: chain runs at {expected} Hz, buffer is {actual} Hz")]
    SampleRateMismatch {
        /// Rate the chain was configured with.
        expected: u32,
        /// Rate carried by the buffer.
        actual: u32,
    },

    /// A stage that needs at least one sample received none.
    #[error("{stage}: empty buffer")]
    EmptyBuffer {
        /// Stage that rejected the buffer.
        stage: &'static str,
    },

    /// A numeric parameter was NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EffectError>;
