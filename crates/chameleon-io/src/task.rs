//! Progress, cancellation and outcome of one offline job.
//!
//! A [`ProcessingTask`] is shared through an `Arc` between the worker that
//! renders and whoever watches it. Progress and the cancel flag are atomics;
//! the outcome sits behind a mutex that is only touched on terminal
//! transitions and when the owner reads the result.
//!
//! ```text
//!            ┌──► Completed(result)
//! Running ───┼──► Failed(message)
//!            └──► Canceled
//! ```
//!
//! The first terminal transition wins; later ones are ignored.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chameleon_core::AudioBuffer;
use parking_lot::Mutex;

/// Lifecycle state of a [`ProcessingTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Still rendering.
    Running,
    /// Finished with a result.
    Completed,
    /// Finished with an error message.
    Failed,
    /// Stopped at a cancellation checkpoint.
    Canceled,
}

impl TaskState {
    /// True for every state except [`TaskState::Running`].
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
        })
    }
}

enum Outcome {
    Running,
    Completed(Option<AudioBuffer>),
    Failed(String),
    Canceled,
}

type ProgressListener = Box<dyn Fn(f32) + Send + Sync>;

/// Shared handle to one offline job.
pub struct ProcessingTask {
    /// `f32` bits of the progress fraction.
    progress: AtomicU32,
    canceled: AtomicBool,
    outcome: Mutex<Outcome>,
    listener: Option<ProgressListener>,
}

impl fmt::Debug for ProcessingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingTask")
            .field("progress", &self.progress())
            .field("cancel_requested", &self.is_cancel_requested())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for ProcessingTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingTask {
    /// A fresh task at progress 0 in [`TaskState::Running`].
    pub fn new() -> Self {
        Self {
            progress: AtomicU32::new(0.0_f32.to_bits()),
            canceled: AtomicBool::new(false),
            outcome: Mutex::new(Outcome::Running),
            listener: None,
        }
    }

    /// A fresh task that calls `listener` with every progress update.
    ///
    /// The listener runs on the worker thread, before the worker checks the
    /// cancel flag at that checkpoint.
    pub fn with_listener(listener: impl Fn(f32) + Send + Sync + 'static) -> Self {
        Self {
            listener: Some(Box::new(listener)),
            ..Self::new()
        }
    }

    /// Current progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Records progress (clamped to `[0, 1]`) and notifies the listener.
    pub fn set_progress(&self, progress: f32) {
        let p = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.progress.store(p.to_bits(), Ordering::Release);
        if let Some(listener) = &self.listener {
            listener(p);
        }
    }

    /// Asks the worker to stop at its next cancellation checkpoint.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Whether [`ProcessingTask::cancel`] has been called.
    pub fn is_cancel_requested(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        match &*self.outcome.lock() {
            Outcome::Running => TaskState::Running,
            Outcome::Completed(_) => TaskState::Completed,
            Outcome::Failed(_) => TaskState::Failed,
            Outcome::Canceled => TaskState::Canceled,
        }
    }

    /// Whether the task reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// A copy of the result, when completed and not yet taken.
    pub fn result(&self) -> Option<AudioBuffer> {
        match &*self.outcome.lock() {
            Outcome::Completed(buffer) => buffer.clone(),
            _ => None,
        }
    }

    /// Moves the result out, leaving the state at [`TaskState::Completed`].
    pub fn take_result(&self) -> Option<AudioBuffer> {
        match &mut *self.outcome.lock() {
            Outcome::Completed(buffer) => buffer.take(),
            _ => None,
        }
    }

    /// The failure message, when failed.
    pub fn error(&self) -> Option<String> {
        match &*self.outcome.lock() {
            Outcome::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Marks the task completed with `result`. Returns false if it had
    /// already finished.
    pub fn complete(&self, result: AudioBuffer) -> bool {
        self.finish(Outcome::Completed(Some(result)))
    }

    /// Marks the task failed. Returns false if it had already finished.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.finish(Outcome::Failed(message.into()))
    }

    /// Marks the task canceled. Returns false if it had already finished.
    pub fn mark_canceled(&self) -> bool {
        self.finish(Outcome::Canceled)
    }

    fn finish(&self, outcome: Outcome) -> bool {
        let mut current = self.outcome.lock();
        if matches!(*current, Outcome::Running) {
            *current = outcome;
            true
        } else {
            false
        }
    }
}
