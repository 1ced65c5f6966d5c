//! Sequential multi-file rendering.

use std::path::{Path, PathBuf};

use chameleon_core::EffectSettings;

use crate::offline::OfflineProcessor;
use crate::task::{ProcessingTask, TaskState};
use crate::wav::save_audio;

/// Prefix added to every output file name.
pub const OUTPUT_PREFIX: &str = "processed_";

/// A set of files to render with one group of settings.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Source files, processed in order.
    pub inputs: Vec<PathBuf>,
    /// Directory that receives `processed_<name>` for each input.
    pub output_dir: PathBuf,
    /// Settings applied to every file.
    pub settings: EffectSettings,
    /// Output bit depth (16, 24 or 32).
    pub bit_depth: u16,
}

impl BatchJob {
    /// A job with the default 16-bit output.
    pub fn new(inputs: Vec<PathBuf>, output_dir: impl Into<PathBuf>, settings: EffectSettings) -> Self {
        Self {
            inputs,
            output_dir: output_dir.into(),
            settings,
            bit_depth: 16,
        }
    }
}

/// One input that did not produce an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// The source file.
    pub input: PathBuf,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of [`BatchProcessor::run_with_report`].
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Files written, in input order.
    pub written: Vec<PathBuf>,
    /// Inputs that failed, in input order.
    pub failures: Vec<BatchFailure>,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, Copy)]
pub enum BatchProgress<'a> {
    /// Work on input `index` (zero-based) of `total` is starting.
    Started {
        /// Position in the job.
        index: usize,
        /// Number of inputs.
        total: usize,
        /// The source file.
        input: &'a Path,
    },
    /// Input `index` was written to `output`.
    Written {
        /// Position in the job.
        index: usize,
        /// Number of inputs.
        total: usize,
        /// The file written.
        output: &'a Path,
    },
    /// Input `index` failed.
    Failed {
        /// Position in the job.
        index: usize,
        /// Number of inputs.
        total: usize,
        /// The source file.
        input: &'a Path,
        /// Why it failed.
        reason: &'a str,
    },
}

/// Output path for `input` inside `output_dir`, or `None` when the input has
/// no file name.
pub fn output_path_for(input: &Path, output_dir: &Path) -> Option<PathBuf> {
    let name = input.file_name()?;
    let mut prefixed = std::ffi::OsString::from(OUTPUT_PREFIX);
    prefixed.push(name);
    Some(output_dir.join(prefixed))
}

/// Renders every file of a [`BatchJob`] in sequence.
///
/// Each file gets its own [`ProcessingTask`]. A file that fails to load,
/// process or save is logged and skipped; the rest of the batch continues.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    offline: OfflineProcessor,
}

impl BatchProcessor {
    /// Wraps an offline processor.
    pub fn new(offline: OfflineProcessor) -> Self {
        Self { offline }
    }

    /// Renders the job and returns the paths written, in input order.
    pub fn run(&self, job: &BatchJob) -> Vec<PathBuf> {
        self.run_with_report(job, |_| {}).written
    }

    /// Renders the job, reporting progress and returning failures as well.
    pub fn run_with_report(
        &self,
        job: &BatchJob,
        mut on_progress: impl FnMut(BatchProgress<'_>),
    ) -> BatchReport {
        let total = job.inputs.len();
        if let Err(err) = std::fs::create_dir_all(&job.output_dir) {
            tracing::error!(
                dir = %job.output_dir.display(),
                error = %err,
                "could not create output directory"
            );
        }

        let mut report = BatchReport::default();
        for (index, input) in job.inputs.iter().enumerate() {
            on_progress(BatchProgress::Started { index, total, input });
            tracing::info!(index = index + 1, total, input = %input.display(), "processing");

            match self.process_one(input, job) {
                Ok(output) => {
                    tracing::info!(output = %output.display(), "saved");
                    on_progress(BatchProgress::Written {
                        index,
                        total,
                        output: &output,
                    });
                    report.written.push(output);
                }
                Err(reason) => {
                    tracing::error!(input = %input.display(), %reason, "batch item failed");
                    on_progress(BatchProgress::Failed {
                        index,
                        total,
                        input,
                        reason: &reason,
                    });
                    report.failures.push(BatchFailure {
                        input: input.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        report
    }

    fn process_one(&self, input: &Path, job: &BatchJob) -> Result<PathBuf, String> {
        let output = output_path_for(input, &job.output_dir)
            .ok_or_else(|| format!("{} has no file name", input.display()))?;

        let task = ProcessingTask::new();
        self.offline.render_file(input, &job.settings, &task);
        match task.state() {
            TaskState::Completed => {
                let buffer = task
                    .take_result()
                    .ok_or_else(|| "completed without a result".to_string())?;
                save_audio(&output, &buffer, job.bit_depth).map_err(|e| e.to_string())?;
                Ok(output)
            }
            TaskState::Failed => Err(task.error().unwrap_or_else(|| "unknown error".into())),
            TaskState::Canceled => Err("canceled".into()),
            TaskState::Running => Err("task did not finish".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_is_prefixed() {
        let out = output_path_for(Path::new("/in/take 1.wav"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/processed_take 1.wav"));
    }

    #[test]
    fn output_name_requires_file_name() {
        assert!(output_path_for(Path::new("/"), Path::new("/out")).is_none());
    }

    #[test]
    fn job_defaults_to_16_bit() {
        let job = BatchJob::new(Vec::new(), "/tmp", EffectSettings::default());
        assert_eq!(job.bit_depth, 16);
    }
}
