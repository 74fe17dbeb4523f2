//! Frame sources: where composited frames come from.
//!
//! The pipeline only needs a probed [`SourceInfo`] and a pull-based [`FrameSource`].
//! [`FfmpegSource`] decodes real files through the system `ffmpeg`; [`MemorySource`] serves
//! pre-built frames for tests and embedding.

use std::path::Path;

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::TrailResult;
use crate::frame::{Frame, PixelLayout};

pub mod ffmpeg;
pub mod memory;

pub use ffmpeg::{FfmpegOpener, FfmpegSource, probe_source};
pub use memory::MemorySource;

/// Stream properties read when a source is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SourceInfo {
    /// Native frame size.
    pub dimensions: Dimensions,
    /// Native frame rate.
    pub fps: Fps,
    /// Reported frame count; `0` when the container does not know it.
    pub frame_count: u64,
    /// Channel order of decoded frames.
    pub layout: PixelLayout,
}

/// Pull-based decoder handle.
pub trait FrameSource {
    /// Properties probed at open time.
    fn info(&self) -> SourceInfo;

    /// Decode the next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> TrailResult<Option<Frame>>;

    /// Release decoder resources. Safe to call more than once.
    fn close(&mut self);
}

/// Opens a [`FrameSource`] for a path.
///
/// Failing to open is reported as [`crate::TrailError::SourceUnavailable`].
pub trait SourceOpener {
    /// Open `path` for decoding.
    fn open(&self, path: &Path) -> TrailResult<Box<dyn FrameSource>>;
}

impl<F> SourceOpener for F
where
    F: Fn(&Path) -> TrailResult<Box<dyn FrameSource>>,
{
    fn open(&self, path: &Path) -> TrailResult<Box<dyn FrameSource>> {
        self(path)
    }
}
