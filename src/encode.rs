//! Output side: the writer contract, the ffmpeg writer, and the bounded encode sink.

pub mod ffmpeg;
pub mod sink;
pub mod writer;

pub use ffmpeg::{FfmpegWriter, FfmpegWriterOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{EncodeSink, EncodeSinkOpts, QUEUE_CAPACITY};
pub use writer::{Container, FrameWriter, InMemoryWriter, SinkConfig};
