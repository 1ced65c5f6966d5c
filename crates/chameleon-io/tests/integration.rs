//! Integration tests for chameleon-io.
//!
//! Exercises the offline and batch paths end to end through real WAV files
//! in temporary directories, plus the stream adapter as a transport would
//! drive it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use chameleon_core::{AudioBuffer, EffectChain, EffectSettings, EngineConfig, SharedSettings, peak};
use chameleon_io::{
    BatchJob, BatchProcessor, BatchProgress, OfflineProcessor, ProcessingTask,
    RealTimeStreamAdapter, StreamStatus, TaskState, load_audio, read_wav_info, save_audio,
};
use tempfile::tempdir;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

const SAMPLE_RATE: u32 = 44100;

fn chain() -> Arc<EffectChain> {
    Arc::new(EffectChain::new(EngineConfig::default()).unwrap())
}

fn tone(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (std::f32::consts::TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * amplitude)
        .collect()
}

fn write_tone(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    save_audio(&path, &AudioBuffer::new(tone(440.0, 0.5, len), SAMPLE_RATE), 16).unwrap();
    path
}

/// Counts ERROR-level events.
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Batch
// ============================================================================

#[test]
fn batch_skips_unreadable_file() {
    let dir = tempdir().unwrap();
    let first = write_tone(dir.path(), "first.wav", 8192);
    let broken = dir.path().join("broken.wav");
    std::fs::write(&broken, b"this is not a wav file").unwrap();
    let third = write_tone(dir.path(), "third.wav", 4096);
    let out_dir = dir.path().join("out");

    let job = BatchJob::new(
        vec![first, broken.clone(), third],
        &out_dir,
        EffectSettings::default(),
    );
    let processor = BatchProcessor::new(OfflineProcessor::new(chain()));

    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let mut failed = Vec::new();
    let report = tracing::subscriber::with_default(subscriber, || {
        processor.run_with_report(&job, |event| {
            if let BatchProgress::Failed { index, .. } = event {
                failed.push(index);
            }
        })
    });

    // One failure log for the unreadable file.
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    assert_eq!(
        report.written,
        vec![out_dir.join("processed_first.wav"), out_dir.join("processed_third.wav")]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].input, broken);
    assert_eq!(failed, vec![1]);

    for path in &report.written {
        let info = read_wav_info(path).unwrap();
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.channels, 1);
    }
}

#[test]
fn batch_run_returns_written_paths() {
    let dir = tempdir().unwrap();
    let a = write_tone(dir.path(), "a.wav", 2048);
    let missing = dir.path().join("missing.wav");
    let out_dir = dir.path().join("nested").join("out");

    let job = BatchJob::new(vec![a, missing], &out_dir, EffectSettings::default());
    let written = BatchProcessor::new(OfflineProcessor::new(chain())).run(&job);

    assert_eq!(written, vec![out_dir.join("processed_a.wav")]);
    let out = load_audio(&written[0], SAMPLE_RATE).unwrap();
    assert_eq!(out.len(), 2048);
}

#[test]
fn batch_output_preserves_length_at_other_rates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("low.wav");
    save_audio(&path, &AudioBuffer::new(vec![0.2; 11025], 22050), 32).unwrap();

    let mut job = BatchJob::new(vec![path], dir.path().join("out"), EffectSettings::default());
    job.bit_depth = 24;
    let written = BatchProcessor::new(OfflineProcessor::new(chain())).run(&job);

    let info = read_wav_info(&written[0]).unwrap();
    assert_eq!(info.sample_rate, SAMPLE_RATE);
    assert_eq!(info.num_frames, 22050);
    assert_eq!(info.bits_per_sample, 24);
}

// ============================================================================
// Offline tasks
// ============================================================================

fn task_canceling_from(threshold: f32) -> Arc<ProcessingTask> {
    // The listener needs a handle to the task it is attached to.
    let slot: Arc<OnceLock<Arc<ProcessingTask>>> = Arc::new(OnceLock::new());
    let listener_slot = Arc::clone(&slot);
    let task = Arc::new(ProcessingTask::with_listener(move |p| {
        if p > threshold
            && let Some(t) = listener_slot.get()
        {
            t.cancel();
        }
    }));
    assert!(slot.set(Arc::clone(&task)).is_ok());
    task
}

#[test]
fn cancel_between_filter_and_delay_checkpoints() {
    // Requested after the 0.5 check has passed, caught before echo and reverb.
    let task = task_canceling_from(0.6);
    let settings = EffectSettings {
        pitch_semitones: 4.0,
        echo_amount: 0.5,
        ..EffectSettings::default()
    };
    OfflineProcessor::new(chain()).render_buffer(
        AudioBuffer::new(tone(300.0, 0.5, 16384), SAMPLE_RATE),
        &settings,
        &task,
    );

    assert_eq!(task.state(), TaskState::Canceled);
    assert_eq!(task.progress(), 0.7);
    assert!(task.result().is_none());
    assert!(task.error().is_none());
}

#[test]
fn cancel_at_filter_checkpoint() {
    let task = task_canceling_from(0.4);
    OfflineProcessor::new(chain()).render_buffer(
        AudioBuffer::new(tone(300.0, 0.5, 4096), SAMPLE_RATE),
        &EffectSettings::default(),
        &task,
    );

    assert_eq!(task.state(), TaskState::Canceled);
    assert_eq!(task.progress(), 0.5);
    assert!(task.result().is_none());
}

#[test]
fn spawned_task_completes_and_reports_progress() {
    let dir = tempdir().unwrap();
    let path = write_tone(dir.path(), "voice.wav", 22050);

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let task = Arc::new(ProcessingTask::with_listener(move |p| sink.lock().unwrap().push(p)));

    let handle = OfflineProcessor::new(chain())
        .spawn(path, EffectSettings::default(), Arc::clone(&task))
        .unwrap();
    assert_eq!(handle.wait(), TaskState::Completed);

    assert_eq!(*progress.lock().unwrap(), vec![0.1, 0.3, 0.5, 0.7, 0.9, 1.0]);
    let result = task.take_result().unwrap();
    assert_eq!(result.len(), 22050);
    assert!(peak(&result.samples) <= 0.99);
}

#[test]
fn spawned_task_fails_on_missing_file() {
    let handle = OfflineProcessor::new(chain())
        .spawn(
            PathBuf::from("/nowhere/at/all.wav"),
            EffectSettings::default(),
            Arc::new(ProcessingTask::new()),
        )
        .unwrap();
    let task = Arc::clone(handle.task());
    assert_eq!(handle.wait(), TaskState::Failed);
    assert!(task.error().is_some());
    assert!(task.result().is_none());
}

// ============================================================================
// Stream adapter
// ============================================================================

#[test]
fn adapter_runs_blocks_independently() {
    let settings = SharedSettings::new(EffectSettings {
        echo_amount: 1.0,
        ..EffectSettings::default()
    });
    let (mut adapter, mut monitor) = RealTimeStreamAdapter::new(chain(), settings, 2, 2);

    let frames = 1024;
    let input: Vec<f32> = tone(500.0, 0.5, frames)
        .into_iter()
        .flat_map(|s| [s, 0.0])
        .collect();
    let mut first = vec![0.0; frames * 2];
    let mut second = vec![0.0; frames * 2];
    adapter.process(&input, &mut first, frames, StreamStatus::default());
    adapter.process(&input, &mut second, frames, StreamStatus::default());

    // No state carries across blocks, so identical input gives identical output.
    assert_eq!(first, second);
    for frame in first.chunks(2) {
        assert_eq!(frame[0], frame[1]);
    }
    assert_eq!(monitor.drain(), 0);
}

#[test]
fn adapter_keeps_running_through_failures() {
    let settings = SharedSettings::new(EffectSettings {
        pitch_semitones: 2.0,
        ..EffectSettings::default()
    });
    let (mut adapter, mut monitor) = RealTimeStreamAdapter::new(chain(), settings, 1, 2);

    let mut out = vec![1.0; 8];
    for _ in 0..5 {
        adapter.process(&[], &mut out, 0, StreamStatus::default());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    let mut out = vec![0.0; 512];
    adapter.process(&tone(300.0, 0.5, 256), &mut out, 256, StreamStatus::default());
    assert!(peak(&out) > 0.0);

    assert_eq!(monitor.drain(), 6);
    assert_eq!(monitor.stage_failures(), 5);
}
