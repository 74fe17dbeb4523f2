//! Star-trail compositing for video.
//!
//! `startrail` turns a night-sky clip into a star-trail video. Every decoded frame is merged
//! into a running composite and the composites are streamed to an encoder, so the output
//! video shows the trails growing over time.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: a [`FrameSource`] yields [`Frame`]s (the system `ffmpeg`, or memory).
//! 2. **Composite**: the [`Compositor`] folds each frame into the trail. A trail at least as
//!    long as the clip is a classic long exposure ([`TrailMode::RunningMax`]); a shorter one
//!    is a fading comet over a sliding window ([`TrailMode::WindowedFade`]).
//! 3. **Hand off**: the [`EncodeSink`] queues composites for a worker thread. The queue is
//!    bounded, so a slow encoder throttles decoding instead of growing memory.
//! 4. **Commit**: the worker scales each frame to the output height (even dimensions, area
//!    averaging) and commits it through a [`FrameWriter`].
//!
//! [`PipelineRun`] drives the loop, reports [`Telemetry`] (progress and periodic previews),
//! and stops cooperatively when its [`CancelToken`] fires.
//!
//! `unsafe` is forbidden in this crate.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod composite;
mod encode;
mod foundation;
mod frame;
mod normalize;
mod pipeline;
mod preview;
mod source;

pub use composite::ops::{max_in_place, max_scaled_in_place, scale_into};
pub use composite::trail::MIN_FADE_WEIGHT;
pub use composite::{Compositor, TrailMode, WeightTable};
pub use encode::sink::POLL_INTERVAL;
pub use encode::{
    Container, EncodeSink, EncodeSinkOpts, FfmpegWriter, FfmpegWriterOpts, FrameWriter,
    InMemoryWriter, QUEUE_CAPACITY, SinkConfig, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use foundation::core::{Dimensions, Fps};
pub use foundation::error::{TrailError, TrailResult};
pub use foundation::math::{ScaleLut, linspace, scale_channel};
pub use frame::{CHANNELS, Frame, PixelLayout};
pub use normalize::{normalize, resize_area, target_dimensions};
pub use pipeline::{
    CancelToken, DEFAULT_FADE, DEFAULT_TRAIL_LENGTH, MAX_FADE, PipelineParams, PipelineRun,
    ProgressSnapshot, ResolutionPreset, RunReport, RunState, Telemetry, default_output_path,
};
pub use preview::{PREVIEW_EVERY, PREVIEW_HEIGHT, PreviewSampler};
pub use source::ffmpeg::is_ffprobe_on_path;
pub use source::{
    FfmpegOpener, FfmpegSource, FrameSource, MemorySource, SourceInfo, SourceOpener, probe_source,
};
