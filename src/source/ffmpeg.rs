use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::{CHANNELS, Frame, PixelLayout};
use crate::source::{FrameSource, SourceInfo, SourceOpener};

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    tags: Option<ProbeTags>,
    side_data_list: Option<Vec<ProbeSideData>>,
}

#[derive(serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

impl ProbeStream {
    /// Display rotation in degrees, normalized to `[0, 360)`.
    ///
    /// The display-matrix side data wins over the legacy `rotate` tag.
    fn rotation_degrees(&self) -> u32 {
        let side = self
            .side_data_list
            .iter()
            .flatten()
            .find_map(|d| d.rotation)
            .filter(|r| r.is_finite());
        let tag = self
            .tags
            .as_ref()
            .and_then(|t| t.rotate.as_deref())
            .and_then(|r| r.trim().parse::<f64>().ok());
        let deg = side.or(tag).unwrap_or(0.0).round() as i64;
        deg.rem_euclid(360) as u32
    }
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe the first video stream of `path` with `ffprobe`.
///
/// Frame rate falls back from `r_frame_rate` to `avg_frame_rate` to 30 fps. Frame count
/// falls back from `nb_frames` to `round(duration * fps)`, and is `0` when neither is known.
/// Quarter-turn rotation metadata swaps width and height to match the decoder's autorotated
/// output.
pub fn probe_source(path: &Path) -> TrailResult<SourceInfo> {
    if !path.is_file() {
        return Err(TrailError::source_unavailable(format!(
            "'{}' does not exist or is not a file",
            path.display()
        )));
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| TrailError::source_unavailable(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(TrailError::source_unavailable(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| TrailError::source_unavailable(format!("ffprobe json parse failed: {e}")))?;
    info_from_probe(&parsed, path)
}

fn info_from_probe(parsed: &ProbeOut, path: &Path) -> TrailResult<SourceInfo> {
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            TrailError::source_unavailable(format!("no video stream in '{}'", path.display()))
        })?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(TrailError::source_unavailable(
                "missing video width/height from ffprobe",
            ));
        }
    };
    // ffprobe reports the coded size; the decoder autorotates, so quarter turns swap sides.
    let (width, height) = match stream.rotation_degrees() {
        90 | 270 => (height, width),
        _ => (width, height),
    };

    let fps = [&stream.r_frame_rate, &stream.avg_frame_rate]
        .into_iter()
        .filter_map(|r| r.as_deref().and_then(Fps::parse_ratio))
        .next()
        .unwrap_or(Fps::FALLBACK);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| {
            stream
                .duration
                .as_deref()
                .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| fps.secs_to_frames_round(d))
        })
        .unwrap_or(0);

    Ok(SourceInfo {
        dimensions: Dimensions::new(width, height),
        fps,
        frame_count,
        layout: PixelLayout::Rgb8,
    })
}

/// Decodes a video file by piping raw `rgb24` frames out of the system `ffmpeg`.
pub struct FfmpegSource {
    path: PathBuf,
    info: SourceInfo,
    frame_bytes: usize,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    exhausted: bool,
}

impl FfmpegSource {
    /// Probe `path` and start the decoder.
    pub fn open(path: &Path) -> TrailResult<Self> {
        let info = probe_source(path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-f",
                "rawvideo",
                "-pix_fmt",
                PixelLayout::Rgb8.ffmpeg_pix_fmt(),
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TrailError::source_unavailable(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrailError::source_unavailable("failed to open ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TrailError::source_unavailable("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let d = info.dimensions;
        tracing::debug!(
            path = %path.display(),
            size = %d,
            fps = %info.fps,
            frames = info.frame_count,
            "decoder started"
        );
        Ok(Self {
            path: path.to_path_buf(),
            info,
            frame_bytes: d.width as usize * d.height as usize * CHANNELS,
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            exhausted: false,
        })
    }

    fn shutdown(&mut self) {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return;
        };
        if !self.exhausted {
            // Stopped early: the decoder would otherwise block on a full pipe.
            let _ = child.kill();
        }
        let status = child.wait();
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default();

        match status {
            Ok(s) if !s.success() && self.exhausted => tracing::warn!(
                path = %self.path.display(),
                status = %s,
                stderr = %String::from_utf8_lossy(&stderr).trim(),
                "decoder exited with an error"
            ),
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to wait for decoder: {e}"),
            _ => {}
        }
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> TrailResult<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; self.frame_bytes];
        let mut filled = 0;
        while filled < buf.len() {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TrailError::source_error(format!(
                        "failed to read decoded frame from ffmpeg: {e}"
                    )));
                }
            }
        }
        if filled < buf.len() {
            if filled > 0 {
                tracing::warn!(
                    bytes = filled,
                    expected = buf.len(),
                    "discarding truncated trailing frame"
                );
            }
            self.exhausted = true;
            return Ok(None);
        }
        let d = self.info.dimensions;
        Frame::from_raw(d.width, d.height, PixelLayout::Rgb8, buf).map(Some)
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// [`SourceOpener`] backed by [`FfmpegSource`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl SourceOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> TrailResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
