use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::{Frame, PixelLayout};
use crate::source::{FrameSource, SourceInfo, SourceOpener};

/// Serves a fixed list of frames.
///
/// Useful for tests and for callers that decode frames themselves. A failure point can be
/// injected with [`MemorySource::fail_after`].
#[derive(Clone, Debug)]
pub struct MemorySource {
    info: SourceInfo,
    frames: VecDeque<Frame>,
    fail_after: Option<u64>,
    pulled: u64,
    closed: Arc<AtomicBool>,
}

impl MemorySource {
    /// Serve `frames` at `fps`. Dimensions and frame count come from the frames themselves.
    pub fn new(frames: Vec<Frame>, fps: Fps) -> Self {
        let (dimensions, layout) = frames
            .first()
            .map(|f| (f.dimensions(), f.layout()))
            .unwrap_or((Dimensions::new(0, 0), PixelLayout::Rgb8));
        Self {
            info: SourceInfo {
                dimensions,
                fps,
                frame_count: frames.len() as u64,
                layout,
            },
            frames: frames.into(),
            fail_after: None,
            pulled: 0,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report `count` as the frame count instead of the real number of frames.
    pub fn with_reported_count(mut self, count: u64) -> Self {
        self.info.frame_count = count;
        self
    }

    /// Fail with a source error instead of returning frame number `n + 1`.
    pub fn fail_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Flag that flips to `true` once [`FrameSource::close`] has run. Clones share it.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    /// An opener that hands out a fresh copy of this source for any path.
    pub fn opener(self) -> impl SourceOpener {
        move |_: &Path| -> TrailResult<Box<dyn FrameSource>> { Ok(Box::new(self.clone())) }
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> TrailResult<Option<Frame>> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        if self.fail_after.is_some_and(|n| self.pulled >= n) {
            return Err(TrailError::source_error(format!(
                "injected decode failure at frame {}",
                self.pulled
            )));
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.pulled += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.frames.clear();
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
