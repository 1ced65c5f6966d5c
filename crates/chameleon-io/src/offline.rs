//! Whole-file rendering driven through a [`ProcessingTask`].
//!
//! Progress checkpoints:
//!
//! | Progress | Point | Cancel checked |
//! |----------|-------|----------------|
//! | 0.1 | source loaded | no |
//! | 0.3 | before the first effect | no |
//! | 0.5 | after the filters | yes |
//! | 0.7 | before echo and reverb | yes |
//! | 0.9 | before the peak clamp | no |
//! | 1.0 | completed | - |
//!
//! Every error ends the task in [`TaskState::Failed`](crate::TaskState::Failed)
//! with a message; nothing is returned to or raised in the caller.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use chameleon_core::{AudioBuffer, EffectChain, EffectSettings, resample_linear};

use crate::task::{ProcessingTask, TaskState};
use crate::wav::load_audio;

/// Progress reported once the source is in memory.
const LOADED_PROGRESS: f32 = 0.1;

/// Renders files and buffers through a shared [`EffectChain`].
#[derive(Debug, Clone)]
pub struct OfflineProcessor {
    chain: Arc<EffectChain>,
}

impl OfflineProcessor {
    /// Wraps a chain. Clones share it.
    pub fn new(chain: Arc<EffectChain>) -> Self {
        Self { chain }
    }

    /// The chain every render goes through.
    pub fn chain(&self) -> &Arc<EffectChain> {
        &self.chain
    }

    /// Loads `path`, renders it and records the outcome in `task`.
    pub fn render_file(&self, path: &Path, settings: &EffectSettings, task: &ProcessingTask) {
        tracing::info!(path = %path.display(), "Loading audio file");
        let buffer = match load_audio(path, self.chain.sample_rate()) {
            Ok(buffer) => buffer,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "load failed");
                task.fail(err.to_string());
                return;
            }
        };
        task.set_progress(LOADED_PROGRESS);
        self.render_samples(buffer.samples, settings, task);
    }

    /// Renders an in-memory buffer, resampling it to the chain rate first.
    pub fn render_buffer(&self, buffer: AudioBuffer, settings: &EffectSettings, task: &ProcessingTask) {
        let rate = self.chain.sample_rate();
        let samples = if buffer.sample_rate == rate {
            buffer.samples
        } else {
            resample_linear(&buffer.samples, buffer.sample_rate, rate)
        };
        task.set_progress(LOADED_PROGRESS);
        self.render_samples(samples, settings, task);
    }

    fn render_samples(&self, samples: Vec<f32>, settings: &EffectSettings, task: &ProcessingTask) {
        let outcome = self.chain.run_observed(&samples, settings, |checkpoint| {
            task.set_progress(checkpoint.progress());
            if checkpoint.checks_cancellation() && task.is_cancel_requested() {
                return ControlFlow::Break(());
            }
            tracing::info!(progress = checkpoint.progress(), "{}", checkpoint.label());
            ControlFlow::Continue(())
        });

        match outcome {
            Ok(Some(processed)) => {
                task.set_progress(1.0);
                task.complete(AudioBuffer::new(processed, self.chain.sample_rate()));
                tracing::info!(samples = samples.len(), "Processing complete");
            }
            Ok(None) => {
                task.mark_canceled();
                tracing::info!(progress = task.progress(), "Processing canceled");
            }
            Err(err) => {
                tracing::debug!(error = %err, "effect stage failed");
                task.fail(err.to_string());
            }
        }
    }

    /// Renders `path` on a new worker thread.
    ///
    /// The returned handle shares `task` with the worker. Fails only when the
    /// thread cannot be spawned.
    pub fn spawn(
        &self,
        path: PathBuf,
        settings: EffectSettings,
        task: Arc<ProcessingTask>,
    ) -> crate::Result<TaskHandle> {
        let processor = self.clone();
        let worker_task = Arc::clone(&task);
        let join = std::thread::Builder::new()
            .name("chameleon-offline".into())
            .spawn(move || processor.render_file(&path, &settings, &worker_task))?;
        Ok(TaskHandle {
            task,
            join: Some(join),
        })
    }
}

/// Owner's side of a spawned offline job.
#[derive(Debug)]
pub struct TaskHandle {
    task: Arc<ProcessingTask>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// The shared task.
    pub fn task(&self) -> &Arc<ProcessingTask> {
        &self.task
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Blocks until the worker exits and returns the final state.
    ///
    /// A worker that panicked leaves the task failed.
    pub fn wait(mut self) -> TaskState {
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            self.task.fail("worker thread panicked");
        }
        self.task.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_core::EngineConfig;

    fn processor() -> OfflineProcessor {
        OfflineProcessor::new(Arc::new(EffectChain::new(EngineConfig::default()).unwrap()))
    }

    #[test]
    fn buffer_render_completes() {
        let task = ProcessingTask::new();
        let input = AudioBuffer::new(vec![0.3; 4096], 44100);
        processor().render_buffer(input, &EffectSettings::default(), &task);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.progress(), 1.0);
        assert_eq!(task.result().unwrap().len(), 4096);
    }

    #[test]
    fn buffer_render_resamples() {
        let task = ProcessingTask::new();
        let input = AudioBuffer::new(vec![0.3; 22050], 22050);
        processor().render_buffer(input, &EffectSettings::default(), &task);
        let out = task.take_result().unwrap();
        assert_eq!(out.sample_rate, 44100);
        assert_eq!(out.len(), 44100);
    }

    #[test]
    fn missing_file_fails_task() {
        let task = ProcessingTask::new();
        processor().render_file(Path::new("/no/such/file.wav"), &EffectSettings::default(), &task);
        assert_eq!(task.state(), TaskState::Failed);
        assert!(task.error().unwrap().contains("/no/such/file.wav"));
        assert!(task.result().is_none());
    }

    #[test]
    fn cancel_before_start_stops_at_first_check() {
        let task = ProcessingTask::new();
        task.cancel();
        processor().render_buffer(
            AudioBuffer::new(vec![0.1; 1024], 44100),
            &EffectSettings::default(),
            &task,
        );
        assert_eq!(task.state(), TaskState::Canceled);
        assert_eq!(task.progress(), 0.5);
    }

    #[test]
    fn effect_error_fails_task() {
        let task = ProcessingTask::new();
        let settings = EffectSettings {
            pitch_semitones: 3.0,
            ..EffectSettings::default()
        };
        processor().render_buffer(AudioBuffer::new(Vec::new(), 44100), &settings, &task);
        assert_eq!(task.state(), TaskState::Failed);
        assert!(task.error().unwrap().contains("empty buffer"));
    }
}
