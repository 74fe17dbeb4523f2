use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::writer::{FrameWriter, SinkConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::{CHANNELS, Frame};

/// Options for [`FfmpegWriter`].
#[derive(Clone, Debug)]
pub struct FfmpegWriterOpts {
    /// Output file path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// x264 constant rate factor.
    pub crf: u8,
}

impl FfmpegWriterOpts {
    /// Options for writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            crf: 18,
        }
    }
}

/// Writer that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Output is H.264 (`libx264`, `yuv420p`) in the configured container.
pub struct FfmpegWriter {
    opts: FfmpegWriterOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
}

impl FfmpegWriter {
    /// Create a writer; nothing is spawned until `begin`.
    pub fn new(opts: FfmpegWriterOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
        }
    }

    fn finish(&mut self) -> TrailResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TrailError::commit("ffmpeg writer not started"))?;
        let status = child
            .wait()
            .map_err(|e| TrailError::commit(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TrailError::commit("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| TrailError::commit(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.cfg = None;
        if !status.success() {
            return Err(TrailError::commit(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl FrameWriter for FfmpegWriter {
    fn begin(&mut self, cfg: SinkConfig) -> TrailResult<()> {
        let d = cfg.dimensions;
        if d.is_empty() {
            return Err(TrailError::commit("ffmpeg writer width/height must be non-zero"));
        }
        if !d.is_even() {
            return Err(TrailError::commit(format!(
                "ffmpeg writer size {d} must be even (required for yuv420p output)"
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(TrailError::commit(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(TrailError::commit(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            cfg.layout.ffmpeg_pix_fmt(),
            "-s",
            &d.to_string(),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-crf",
            &self.opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            cfg.container.ffmpeg_format(),
        ]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            TrailError::commit(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrailError::commit("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TrailError::commit("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            size = %d,
            fps = %cfg.fps,
            container = %cfg.container,
            "encoder started"
        );
        self.scratch = Vec::with_capacity(d.width as usize * d.height as usize * CHANNELS);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> TrailResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TrailError::commit("ffmpeg writer not started"))?;
        if frame.dimensions() != cfg.dimensions {
            return Err(TrailError::commit(format!(
                "frame size mismatch: got {}, expected {}",
                frame.dimensions(),
                cfg.dimensions
            )));
        }

        self.scratch.clear();
        let swap = frame.layout() != cfg.layout;
        for row in frame.rows() {
            if swap {
                for px in row.chunks_exact(CHANNELS) {
                    self.scratch.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            } else {
                self.scratch.extend_from_slice(row);
            }
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TrailError::commit("ffmpeg writer is already finalized"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| TrailError::commit(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn end(&mut self) -> TrailResult<()> {
        self.finish()
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.child.is_some()
            && let Err(e) = self.finish()
        {
            tracing::warn!("ffmpeg writer dropped without end(): {e}");
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // rawvideo input takes its rate from `-r` before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> TrailResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            TrailError::commit(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
