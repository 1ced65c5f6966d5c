//! Per-block bridge between a transport callback and the effect chain.
//!
//! The adapter runs on the audio thread. Each call snapshots the shared
//! settings, pulls channel 0 out of the interleaved input, runs the full chain
//! on that block alone and writes the result to every output channel. Nothing
//! carries over between blocks: echo and reverb tails end at the block edge.
//!
//! The audio thread never logs. Anything worth reporting becomes a
//! [`StreamEvent`] pushed with `try_send` into a bounded channel; when the
//! channel is full the event is dropped. A [`StreamMonitor`] on the control
//! thread drains and logs the events.
//!
//! ```text
//! cpal callback ──process()──► RealTimeStreamAdapter ──try_send──► StreamMonitor
//!                                     ▲                               │
//!                          SharedSettings::snapshot()          drain() → tracing
//! ```

use std::sync::Arc;

use chameleon_core::{EffectChain, EffectError, SharedSettings};
use crossbeam_channel::{Receiver, Sender};

/// Capacity of the adapter's event channel.
pub const EVENT_CAPACITY: usize = 64;

/// Consecutive-failure interval at which the monitor repeats a summary.
const FAILURE_SUMMARY_INTERVAL: u32 = 100;

/// Status flags the transport reports alongside a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatus {
    /// Captured input was dropped before it could be processed.
    pub input_overflow: bool,
    /// Not enough input arrived to fill the output block.
    pub output_underflow: bool,
}

impl StreamStatus {
    /// True when no flag is set.
    pub fn is_clean(self) -> bool {
        !self.input_overflow && !self.output_underflow
    }
}

/// Something the audio thread wants the control thread to know.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The transport flagged an overflow or underflow.
    TransportFault(StreamStatus),
    /// A stage failed and the block was replaced by silence.
    StageFailed {
        /// The stage error.
        error: EffectError,
        /// Failures in a row, including this one.
        consecutive: u32,
    },
    /// A block succeeded after one or more failures.
    Recovered {
        /// Length of the failure run that just ended.
        after: u32,
    },
}

/// Runs the effect chain once per transport block.
pub struct RealTimeStreamAdapter {
    chain: Arc<EffectChain>,
    settings: SharedSettings,
    input_channels: usize,
    output_channels: usize,
    mono: Vec<f32>,
    events: Sender<StreamEvent>,
    consecutive_failures: u32,
}

impl std::fmt::Debug for RealTimeStreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealTimeStreamAdapter")
            .field("sample_rate", &self.chain.sample_rate())
            .field("input_channels", &self.input_channels)
            .field("output_channels", &self.output_channels)
            .field("consecutive_failures", &self.consecutive_failures)
            .finish_non_exhaustive()
    }
}

impl RealTimeStreamAdapter {
    /// Creates an adapter and the monitor that receives its events.
    ///
    /// Channel counts of zero are treated as one.
    pub fn new(
        chain: Arc<EffectChain>,
        settings: SharedSettings,
        input_channels: u16,
        output_channels: u16,
    ) -> (Self, StreamMonitor) {
        let (tx, rx) = crossbeam_channel::bounded(EVENT_CAPACITY);
        let block_size = chain.config().block_size;
        let adapter = Self {
            chain,
            settings,
            input_channels: usize::from(input_channels.max(1)),
            output_channels: usize::from(output_channels.max(1)),
            mono: Vec::with_capacity(block_size),
            events: tx,
            consecutive_failures: 0,
        };
        (adapter, StreamMonitor::new(rx))
    }

    /// Interleaved input channel count.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Interleaved output channel count.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// The settings handle this adapter reads.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Processes one block of `frames` frames.
    ///
    /// `input` and `output` are interleaved. Missing input frames read as
    /// silence; output samples past `frames` frames are zeroed. A failing
    /// stage silences the block and is reported as an event; this method
    /// never panics on chain errors and never blocks.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], frames: usize, status: StreamStatus) {
        if !status.is_clean() {
            self.emit(StreamEvent::TransportFault(status));
        }

        self.mono.clear();
        self.mono.extend(
            (0..frames).map(|f| input.get(f * self.input_channels).copied().unwrap_or(0.0)),
        );

        let settings = self.settings.snapshot();
        match self.chain.run(&self.mono, &settings) {
            Ok(processed) => {
                if self.consecutive_failures > 0 {
                    let after = self.consecutive_failures;
                    self.consecutive_failures = 0;
                    self.emit(StreamEvent::Recovered { after });
                }
                let written = frames * self.output_channels;
                for (frame, &sample) in output.chunks_mut(self.output_channels).zip(&processed) {
                    frame.fill(sample);
                }
                if output.len() > written {
                    output[written..].fill(0.0);
                }
            }
            Err(error) => {
                output.fill(0.0);
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let consecutive = self.consecutive_failures;
                self.emit(StreamEvent::StageFailed { error, consecutive });
            }
        }
    }

    fn emit(&self, event: StreamEvent) {
        // A full or disconnected channel drops the event.
        let _ = self.events.try_send(event);
    }
}

/// Drains adapter events on the control thread and logs them.
#[derive(Debug)]
pub struct StreamMonitor {
    events: Receiver<StreamEvent>,
    transport_faults: u64,
    stage_failures: u64,
}

impl StreamMonitor {
    fn new(events: Receiver<StreamEvent>) -> Self {
        Self {
            events,
            transport_faults: 0,
            stage_failures: 0,
        }
    }

    /// Logs every pending event and returns how many there were.
    ///
    /// A failure run logs its first block as an error and then a summary
    /// every hundred blocks, so a stuck stage does not flood the log.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events.try_recv() {
            count += 1;
            match event {
                StreamEvent::TransportFault(status) => {
                    self.transport_faults += 1;
                    tracing::warn!(
                        input_overflow = status.input_overflow,
                        output_underflow = status.output_underflow,
                        "transport fault"
                    );
                }
                StreamEvent::StageFailed { error, consecutive } => {
                    self.stage_failures += 1;
                    if consecutive == 1 {
                        tracing::error!(%error, "effect stage failed, block silenced");
                    } else if consecutive % FAILURE_SUMMARY_INTERVAL == 0 {
                        tracing::error!(%error, consecutive, "effect stage still failing");
                    }
                }
                StreamEvent::Recovered { after } => {
                    tracing::info!(silenced_blocks = after, "effect chain recovered");
                }
            }
        }
        count
    }

    /// Pulls the next pending event without logging it.
    pub fn try_next(&self) -> Option<StreamEvent> {
        self.events.try_recv().ok()
    }

    /// Transport faults seen by [`StreamMonitor::drain`] so far.
    pub fn transport_faults(&self) -> u64 {
        self.transport_faults
    }

    /// Silenced blocks seen by [`StreamMonitor::drain`] so far.
    pub fn stage_failures(&self) -> u64 {
        self.stage_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_core::{EffectSettings, EngineConfig};

    fn adapter(settings: EffectSettings, in_ch: u16, out_ch: u16) -> (RealTimeStreamAdapter, StreamMonitor) {
        let chain = Arc::new(EffectChain::new(EngineConfig::new(44100, 256)).unwrap());
        RealTimeStreamAdapter::new(chain, SharedSettings::new(settings), in_ch, out_ch)
    }

    fn passthrough() -> EffectSettings {
        EffectSettings {
            volume: 1.0,
            ..EffectSettings::bypass()
        }
    }

    #[test]
    fn replicates_channel_zero() {
        let (mut a, _m) = adapter(passthrough(), 2, 3);
        // L = 0.1*f, R = -1 (ignored)
        let input: Vec<f32> = (0..4).flat_map(|f| [0.1 * f as f32, -1.0]).collect();
        let mut output = vec![9.0; 12];
        a.process(&input, &mut output, 4, StreamStatus::default());
        for f in 0..4 {
            for c in 0..3 {
                assert!((output[f * 3 + c] - 0.1 * f as f32).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn short_input_reads_as_silence() {
        let (mut a, _m) = adapter(passthrough(), 1, 1);
        let mut output = vec![9.0; 4];
        a.process(&[0.5, 0.5], &mut output, 4, StreamStatus::default());
        assert_eq!(output, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn surplus_output_is_zeroed() {
        let (mut a, _m) = adapter(passthrough(), 1, 2);
        let mut output = vec![9.0; 8];
        a.process(&[0.25, 0.25], &mut output, 2, StreamStatus::default());
        assert_eq!(&output[..4], &[0.25; 4]);
        assert_eq!(&output[4..], &[0.0; 4]);
    }

    #[test]
    fn stage_error_silences_block() {
        let settings = EffectSettings {
            pitch_semitones: 5.0,
            ..passthrough()
        };
        let (mut a, mut m) = adapter(settings, 1, 2);
        let mut output = vec![9.0; 6];
        // Zero frames makes the pitch shifter reject the empty block.
        a.process(&[], &mut output, 0, StreamStatus::default());
        assert_eq!(output, vec![0.0; 6]);

        match m.try_next() {
            Some(StreamEvent::StageFailed { error, consecutive }) => {
                assert!(matches!(error, EffectError::EmptyBuffer { .. }));
                assert_eq!(consecutive, 1);
            }
            other => panic!("expected StageFailed, got {other:?}"),
        }
        assert_eq!(m.drain(), 0);
    }

    #[test]
    fn recovery_is_reported() {
        let settings = EffectSettings {
            pitch_semitones: 5.0,
            ..passthrough()
        };
        let (mut a, mut m) = adapter(settings, 1, 1);
        let mut empty: [f32; 0] = [];
        a.process(&[], &mut empty, 0, StreamStatus::default());
        a.process(&[], &mut empty, 0, StreamStatus::default());
        let mut out = vec![0.0; 64];
        a.process(&[0.1; 64], &mut out, 64, StreamStatus::default());

        assert_eq!(m.drain(), 3);
        assert_eq!(m.stage_failures(), 2);
    }

    #[test]
    fn transport_fault_forwarded() {
        let (mut a, m) = adapter(passthrough(), 1, 1);
        let status = StreamStatus {
            output_underflow: true,
            ..StreamStatus::default()
        };
        let mut out = vec![0.0; 8];
        a.process(&[0.0; 8], &mut out, 8, status);
        assert_eq!(m.try_next(), Some(StreamEvent::TransportFault(status)));
    }

    #[test]
    fn full_channel_drops_events() {
        let (mut a, mut m) = adapter(passthrough(), 1, 1);
        let status = StreamStatus {
            input_overflow: true,
            ..StreamStatus::default()
        };
        let mut out = vec![0.0; 4];
        for _ in 0..EVENT_CAPACITY * 2 {
            a.process(&[0.0; 4], &mut out, 4, status);
        }
        assert_eq!(m.drain(), EVENT_CAPACITY);
        assert_eq!(m.transport_faults(), EVENT_CAPACITY as u64);
    }

    #[test]
    fn settings_changes_apply_next_block() {
        let (mut a, _m) = adapter(passthrough(), 1, 1);
        let mut out = vec![0.0; 4];
        a.process(&[0.5; 4], &mut out, 4, StreamStatus::default());
        assert_eq!(out, vec![0.5; 4]);

        a.settings().set_volume(0.5);
        a.process(&[0.5; 4], &mut out, 4, StreamStatus::default());
        assert_eq!(out, vec![0.25; 4]);
    }
}
