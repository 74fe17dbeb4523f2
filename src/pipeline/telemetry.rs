use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::frame::Frame;

/// Per-frame progress, derived and never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Frames composited and submitted so far.
    pub frames_done: u64,
    /// Reported frame count of the source; `0` when unknown.
    pub total_frames: u64,
    /// Average frames per second since the run started.
    pub fps: f64,
}

impl ProgressSnapshot {
    /// Snapshot for `frames_done` frames after `elapsed`. The rate is `0` until time has passed.
    pub fn measure(frames_done: u64, total_frames: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let fps = if secs > 0.0 {
            frames_done as f64 / secs
        } else {
            0.0
        };
        Self {
            frames_done,
            total_frames,
            fps,
        }
    }

    /// Completed fraction in `[0, 1]`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        (self.total_frames > 0)
            .then(|| (self.frames_done as f64 / self.total_frames as f64).min(1.0))
    }
}

type ProgressFn<'a> = Box<dyn FnMut(ProgressSnapshot) + 'a>;
type PreviewFn<'a> = Box<dyn FnMut(u64, Frame) + 'a>;

/// Optional observers of a run, called synchronously on the compositing thread.
///
/// Callbacks should be cheap; they delay the next frame.
#[derive(Default)]
pub struct Telemetry<'a> {
    progress: Option<ProgressFn<'a>>,
    preview: Option<PreviewFn<'a>>,
}

impl<'a> Telemetry<'a> {
    /// No observers.
    pub fn none() -> Self {
        Self::default()
    }

    /// Call `f` after every processed frame.
    pub fn on_progress(mut self, f: impl FnMut(ProgressSnapshot) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Call `f` with `(frame index, preview)` for every sampled frame.
    pub fn on_preview(mut self, f: impl FnMut(u64, Frame) + 'a) -> Self {
        self.preview = Some(Box::new(f));
        self
    }

    pub(crate) fn wants_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub(crate) fn emit_progress(&mut self, snapshot: ProgressSnapshot) {
        if let Some(f) = self.progress.as_mut() {
            f(snapshot);
        }
    }

    pub(crate) fn emit_preview(&mut self, index: u64, preview: Frame) {
        if let Some(f) = self.preview.as_mut() {
            f(index, preview);
        }
    }
}

impl std::fmt::Debug for Telemetry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("progress", &self.progress.is_some())
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

/// Cooperative cancellation flag shared between a run and its controller.
///
/// The run checks it once per frame; an in-flight frame always completes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/telemetry.rs"]
mod tests;
