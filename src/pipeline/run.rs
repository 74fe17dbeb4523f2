use std::time::{Duration, Instant};

use crate::composite::{Compositor, TrailMode};
use crate::encode::ffmpeg::{FfmpegWriter, FfmpegWriterOpts};
use crate::encode::sink::{EncodeSink, EncodeSinkOpts};
use crate::encode::writer::{FrameWriter, SinkConfig};
use crate::foundation::core::Dimensions;
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::Frame;
use crate::normalize::target_dimensions;
use crate::pipeline::params::PipelineParams;
use crate::pipeline::telemetry::{CancelToken, ProgressSnapshot, Telemetry};
use crate::preview::PreviewSampler;
use crate::source::{FfmpegOpener, FrameSource, SourceInfo, SourceOpener};

/// Lifecycle of a [`PipelineRun`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, not started.
    Idle,
    /// Inside [`PipelineRun::execute`].
    Running,
    /// The source was exhausted and every frame was committed.
    Completed,
    /// Stopped early through the [`CancelToken`]; the partial output is finalized.
    Cancelled,
    /// Ended with an error.
    Failed,
}

impl RunState {
    /// `true` for `Completed`, `Cancelled`, and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Outcome of a run that did not fail.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// `Completed` or `Cancelled`.
    pub state: RunState,
    /// Frames pulled from the source and composited.
    pub frames_processed: u64,
    /// Frames the writer committed.
    pub frames_committed: u64,
    /// Frame count the source reported; `0` when unknown.
    pub total_frames: u64,
    /// Trail algorithm used.
    pub mode: TrailMode,
    /// Probed source properties.
    pub source: SourceInfo,
    /// Size of every committed frame.
    pub output_dimensions: Dimensions,
    /// Last composited frame at source resolution, if any frame was processed.
    pub final_frame: Option<Frame>,
    /// Wall time from opening the source to releasing the output.
    pub elapsed: Duration,
}

struct PumpOutcome {
    processed: u64,
    cancelled: bool,
    final_frame: Option<Frame>,
}

/// One star-trail run: source → compositor → encode sink, with telemetry and cancellation.
///
/// A run executes at most once. Use [`PipelineRun::cancel_token`] to stop it from another
/// thread or from a telemetry callback.
#[derive(Debug)]
pub struct PipelineRun {
    params: PipelineParams,
    state: RunState,
    cancel: CancelToken,
    preview: PreviewSampler,
    sink_opts: EncodeSinkOpts,
}

impl PipelineRun {
    /// Validate `params` and prepare an idle run.
    pub fn new(params: PipelineParams) -> TrailResult<Self> {
        params.validate()?;
        let sink_opts = EncodeSinkOpts {
            target_height: params.target_height,
            ..EncodeSinkOpts::default()
        };
        Ok(Self {
            params,
            state: RunState::Idle,
            cancel: CancelToken::new(),
            preview: PreviewSampler::default(),
            sink_opts,
        })
    }

    /// Replace the preview sampling policy.
    pub fn with_preview_sampler(mut self, sampler: PreviewSampler) -> Self {
        self.preview = sampler;
        self
    }

    /// Parameters of this run.
    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// A handle that cancels this run.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run against the input and output files named in the parameters, using `ffmpeg`.
    pub fn execute_to_file(&mut self, telemetry: &mut Telemetry<'_>) -> TrailResult<RunReport> {
        let mut writer = FfmpegWriter::new(FfmpegWriterOpts::new(&self.params.output));
        self.execute(&FfmpegOpener, &mut writer, telemetry)
    }

    /// Drive the run to a terminal state.
    ///
    /// The source is always closed and the encode sink always drained and joined, whatever
    /// the outcome. Errors leave the run in [`RunState::Failed`].
    #[tracing::instrument(
        skip_all,
        fields(input = %self.params.input.display(), output = %self.params.output.display())
    )]
    pub fn execute(
        &mut self,
        opener: &dyn SourceOpener,
        writer: &mut dyn FrameWriter,
        telemetry: &mut Telemetry<'_>,
    ) -> TrailResult<RunReport> {
        if self.state != RunState::Idle {
            return Err(TrailError::contract(format!(
                "a pipeline run executes once (state is {:?})",
                self.state
            )));
        }
        self.state = RunState::Running;

        let result = self.drive(opener, writer, telemetry);
        self.state = match &result {
            Ok(report) => report.state,
            Err(e) => {
                tracing::error!("run failed: {e}");
                RunState::Failed
            }
        };
        result
    }

    fn drive(
        &self,
        opener: &dyn SourceOpener,
        writer: &mut dyn FrameWriter,
        telemetry: &mut Telemetry<'_>,
    ) -> TrailResult<RunReport> {
        let started = Instant::now();
        let mut source = opener.open(&self.params.input)?;
        let info = source.info();
        if info.dimensions.is_empty() {
            source.close();
            return Err(TrailError::source_unavailable(format!(
                "'{}' has no decodable frames",
                self.params.input.display()
            )));
        }
        if info.dimensions.width < 2 || info.dimensions.height < 2 {
            source.close();
            return Err(TrailError::source_unavailable(format!(
                "'{}' is {}; both sides must be at least 2 pixels",
                self.params.input.display(),
                info.dimensions
            )));
        }

        let mode = TrailMode::select(self.params.trail_length, self.params.fade, info.frame_count);
        let output_dimensions = target_dimensions(info.dimensions, self.params.target_height);
        let cfg = SinkConfig {
            dimensions: output_dimensions,
            fps: info.fps,
            layout: info.layout,
            container: self.params.container,
        };
        tracing::info!(
            source = %info.dimensions,
            output = %output_dimensions,
            fps = %info.fps,
            frames = info.frame_count,
            %mode,
            "starting run"
        );

        let outcome = std::thread::scope(|scope| {
            let mut sink = EncodeSink::start(scope, writer, cfg, self.sink_opts)?;
            let pumped = self.pump(source.as_mut(), &mut sink, mode, info, telemetry, started);
            sink.request_stop();
            let joined = sink.join();
            Ok::<_, TrailError>((pumped, joined))
        });
        source.close();

        let (pumped, committed) = match outcome? {
            (Ok(p), Ok(c)) => (p, c),
            (Err(e @ TrailError::Source(_)), _) => return Err(e),
            (_, Err(e)) => return Err(e),
            (Err(e), Ok(_)) => return Err(e),
        };

        let state = if pumped.cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        };
        if !pumped.cancelled && info.frame_count > 0 && pumped.processed < info.frame_count {
            tracing::warn!(
                processed = pumped.processed,
                expected = info.frame_count,
                "source ended before its reported frame count"
            );
        }
        let elapsed = started.elapsed();
        tracing::info!(
            state = ?state,
            processed = pumped.processed,
            committed,
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );

        Ok(RunReport {
            state,
            frames_processed: pumped.processed,
            frames_committed: committed,
            total_frames: info.frame_count,
            mode,
            source: info,
            output_dimensions,
            final_frame: pumped.final_frame,
            elapsed,
        })
    }

    fn pump(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut EncodeSink<'_>,
        mode: TrailMode,
        info: SourceInfo,
        telemetry: &mut Telemetry<'_>,
        started: Instant,
    ) -> TrailResult<PumpOutcome> {
        let total = info.frame_count;
        let mut compositor = Compositor::new(mode);
        let mut processed = 0u64;
        let mut cancelled = false;

        loop {
            if total > 0 && processed >= total {
                break;
            }
            if self.cancel.is_cancelled() {
                tracing::info!(processed, "cancellation observed");
                cancelled = true;
                break;
            }
            let Some(frame) = source.next_frame()? else {
                break;
            };
            if frame.dimensions() != info.dimensions || frame.layout() != info.layout {
                return Err(TrailError::source_error(format!(
                    "frame {processed} is {} {:?}, expected {} {:?}",
                    frame.dimensions(),
                    frame.layout(),
                    info.dimensions,
                    info.layout
                )));
            }

            let composite = compositor.composite(frame);
            sink.submit(composite.clone())?;
            if telemetry.wants_preview()
                && let Some(preview) = self.preview.sample(processed, composite)
            {
                telemetry.emit_preview(processed, preview);
            }
            processed += 1;
            telemetry.emit_progress(ProgressSnapshot::measure(processed, total, started.elapsed()));
        }

        Ok(PumpOutcome {
            processed,
            cancelled,
            final_frame: compositor.current().cloned(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
