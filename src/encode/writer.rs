use std::path::Path;

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::{Frame, PixelLayout};

/// Output container. Both carry H.264 video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// MPEG-4 Part 14.
    #[default]
    Mp4,
    /// QuickTime.
    Mov,
}

impl Container {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }

    /// ffmpeg muxer name passed to `-f`.
    pub fn ffmpeg_format(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }

    /// Guess the container from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "mov" | "qt" => Some(Self::Mov),
            _ => None,
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Stream parameters handed to a [`FrameWriter`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Size of every committed frame. Must be even for H.264/yuv420p.
    pub dimensions: Dimensions,
    /// Output frame rate.
    pub fps: Fps,
    /// Channel order of incoming frames.
    pub layout: PixelLayout,
    /// Container to mux into.
    pub container: Container,
}

/// Writer contract for committing frames to an output stream in order.
///
/// `begin` is called once, then `push_frame` for each frame, then `end` once. Any error is
/// fatal to the stream.
pub trait FrameWriter: Send {
    /// Open the output stream.
    fn begin(&mut self, cfg: SinkConfig) -> TrailResult<()>;
    /// Commit one frame.
    fn push_frame(&mut self, frame: &Frame) -> TrailResult<()>;
    /// Finalize and release the output stream.
    fn end(&mut self) -> TrailResult<()>;
}

/// In-memory writer for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    cfg: Option<SinkConfig>,
    pub(crate) frames: Vec<Frame>,
    ended: bool,
    fail_at: Option<usize>,
}

impl InMemoryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `push_frame` fail once `n` frames have been committed.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Committed frames, in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameWriter for InMemoryWriter {
    fn begin(&mut self, cfg: SinkConfig) -> TrailResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> TrailResult<()> {
        if self.fail_at.is_some_and(|n| self.frames.len() >= n) {
            return Err(TrailError::commit("in-memory writer refused frame"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> TrailResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/writer.rs"]
mod tests;
