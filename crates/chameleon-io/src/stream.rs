//! Real-time duplex audio via cpal.
//!
//! Capture and playback are separate cpal streams. The input callback copies
//! each captured block into a bounded channel; the output callback collects
//! what has arrived and hands one block at a time to the
//! [`RealTimeStreamAdapter`]. When too little input is available the block is
//! padded with silence and flagged as an underflow; when the input channel is
//! full the block is dropped and flagged as an overflow.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chameleon_core::EngineConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

use crate::adapter::{RealTimeStreamAdapter, StreamMonitor, StreamStatus};
use crate::{Error, Result};

/// Captured blocks buffered between the input and output callbacks.
const INPUT_QUEUE_BLOCKS: usize = 4;
/// Pending input beyond this many blocks is discarded as overflow.
const MAX_PENDING_BLOCKS: usize = 8;
/// How often the control loop drains stream events.
const MONITOR_INTERVAL: Duration = Duration::from_millis(100);

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Duplex stream configuration.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Sample rate and block size requested from the devices.
    pub engine: EngineConfig,
    /// Input device name or index (uses default if `None`).
    pub input_device: Option<String>,
    /// Output device name or index (uses default if `None`).
    pub output_device: Option<String>,
}

/// List all available audio devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                let default_sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(chameleon_core::settings::DEFAULT_SAMPLE_RATE);
                devices.push(AudioDevice {
                    name,
                    is_input: true,
                    is_output: device.default_output_config().is_ok(),
                    default_sample_rate,
                });
            }
        }
    }

    // Output-only devices
    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                let default_sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(chameleon_core::settings::DEFAULT_SAMPLE_RATE);
                devices.push(AudioDevice {
                    name,
                    is_input: false,
                    is_output: true,
                    default_sample_rate,
                });
            }
        }
    }

    Ok(devices)
}

/// Default input and output devices, when present.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();

    let input = host.default_input_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: true,
            is_output: false,
            default_sample_rate: d
                .default_input_config()
                .map(|c| c.sample_rate())
                .unwrap_or(chameleon_core::settings::DEFAULT_SAMPLE_RATE),
        })
    });

    let output = host.default_output_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: false,
            is_output: true,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(chameleon_core::settings::DEFAULT_SAMPLE_RATE),
        })
    });

    Ok((input, output))
}

/// Find a device by zero-based index among inputs or outputs.
pub fn find_device_by_index(index: usize, is_input: bool) -> Result<AudioDevice> {
    let devices = list_devices()?;
    let filtered: Vec<_> = devices
        .into_iter()
        .filter(|d| if is_input { d.is_input } else { d.is_output })
        .collect();
    let available = filtered.len();

    filtered.into_iter().nth(index).ok_or_else(|| {
        Error::DeviceNotFound(format!(
            "{} device index {} (only {} devices available)",
            if is_input { "input" } else { "output" },
            index,
            available
        ))
    })
}

/// Duplex input/output stream feeding a [`RealTimeStreamAdapter`].
pub struct AudioStream {
    input_device: Device,
    output_device: Device,
    config: StreamConfig,
    running: Arc<AtomicBool>,
    _input_stream: Option<Stream>,
    _output_stream: Option<Stream>,
}

impl AudioStream {
    /// Opens the configured (or default) devices.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();

        let input_device = match &config.input_device {
            Some(name) => find_device(&host, name, true)?,
            None => host.default_input_device().ok_or(Error::NoDevice)?,
        };
        let output_device = match &config.output_device {
            Some(name) => find_device(&host, name, false)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };

        tracing::info!(
            host = host.id().name(),
            input = %device_name(&input_device).unwrap_or_default(),
            output = %device_name(&output_device).unwrap_or_default(),
            "audio devices opened"
        );

        Ok(Self {
            input_device,
            output_device,
            config,
            running: Arc::new(AtomicBool::new(false)),
            _input_stream: None,
            _output_stream: None,
        })
    }

    /// Engine configuration requested from the devices.
    pub fn engine_config(&self) -> EngineConfig {
        self.config.engine
    }

    /// Input device channel count.
    pub fn input_channels(&self) -> u16 {
        self.input_device
            .default_input_config()
            .map(|c| c.channels())
            .unwrap_or(1)
    }

    /// Output device channel count.
    pub fn output_channels(&self) -> u16 {
        self.output_device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2)
    }

    /// Flag that keeps [`AudioStream::run_duplex`] alive; store `false` to stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Streams microphone input through `adapter` to the output device.
    ///
    /// Blocks until [`AudioStream::stop`] is called or the running flag is
    /// cleared, draining `monitor` on this thread in the meantime.
    pub fn run_duplex(
        &mut self,
        mut adapter: RealTimeStreamAdapter,
        monitor: &mut StreamMonitor,
    ) -> Result<()> {
        let engine = self.config.engine;
        let in_ch = adapter.input_channels();
        let out_ch = adapter.output_channels();
        let block_size = u32::try_from(engine.block_size)
            .map_err(|_| Error::Stream(format!("block size {} too large", engine.block_size)))?;

        let input_config = cpal::StreamConfig {
            channels: in_ch as u16,
            sample_rate: engine.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(block_size),
        };
        let output_config = cpal::StreamConfig {
            channels: out_ch as u16,
            sample_rate: engine.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(block_size),
        };

        let (tx, rx) = crossbeam_channel::bounded::<Vec<f32>>(INPUT_QUEUE_BLOCKS);
        let overflow = Arc::new(AtomicBool::new(false));
        self.running.store(true, Ordering::SeqCst);

        let input_overflow = Arc::clone(&overflow);
        let input_stream = self
            .input_device
            .build_input_stream(
                &input_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if tx.try_send(data.to_vec()).is_err() {
                        input_overflow.store(true, Ordering::Relaxed);
                    }
                },
                |err| tracing::error!(error = %err, "input stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        let output_running = Arc::clone(&self.running);
        let mut pending: Vec<f32> = Vec::with_capacity(engine.block_size * in_ch * MAX_PENDING_BLOCKS);
        let output_stream = self
            .output_device
            .build_output_stream(
                &output_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !output_running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }

                    while let Ok(block) = rx.try_recv() {
                        pending.extend_from_slice(&block);
                    }

                    let frames = data.len() / out_ch;
                    let needed = frames * in_ch;
                    let mut status = StreamStatus {
                        input_overflow: overflow.swap(false, Ordering::Relaxed),
                        output_underflow: pending.len() < needed,
                    };
                    let limit = needed * MAX_PENDING_BLOCKS;
                    if pending.len() > limit {
                        pending.drain(..pending.len() - limit);
                        status.input_overflow = true;
                    }
                    if pending.len() < needed {
                        pending.resize(needed, 0.0);
                    }

                    adapter.process(&pending[..needed], data, frames, status);
                    pending.drain(..needed);
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        input_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            sample_rate = engine.sample_rate,
            block_size = engine.block_size,
            input_channels = in_ch,
            output_channels = out_ch,
            "duplex stream started"
        );

        self._input_stream = Some(input_stream);
        self._output_stream = Some(output_stream);

        while self.running.load(Ordering::SeqCst) {
            monitor.drain();
            std::thread::sleep(MONITOR_INTERVAL);
        }
        monitor.drain();

        self._input_stream = None;
        self._output_stream = None;
        tracing::info!(
            transport_faults = monitor.transport_faults(),
            silenced_blocks = monitor.stage_failures(),
            "duplex stream stopped"
        );
        Ok(())
    }

    /// Stop the audio stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Find a device by index, exact name, or case-insensitive partial name.
fn find_device(host: &Host, name_or_index: &str, is_input: bool) -> Result<Device> {
    let kind = if is_input { "input" } else { "output" };
    let devices: Vec<Device> = if is_input {
        host.input_devices()
            .map_err(|e| Error::Stream(e.to_string()))?
            .collect()
    } else {
        host.output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?
            .collect()
    };

    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "{kind} device index {index} (only {} devices available)",
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search = name_or_index.to_lowercase();
    let matches: Vec<(Device, String)> = devices
        .iter()
        .filter_map(|d| {
            let name = device_name(d).ok()?;
            name.to_lowercase().contains(&search).then(|| (d.clone(), name))
        })
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no {kind} device matching '{name_or_index}'"
        ))),
        [(device, _)] => Ok(device.clone()),
        [(device, first), ..] => {
            let names: Vec<&str> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                ?names,
                chosen = %first,
                "{kind} device name is ambiguous, using first match"
            );
            Ok(device.clone())
        }
    }
}
