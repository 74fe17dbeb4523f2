//! Run orchestration: parameters, telemetry, and the driving loop.

pub mod params;
pub mod run;
pub mod telemetry;

pub use params::{
    DEFAULT_FADE, DEFAULT_TRAIL_LENGTH, MAX_FADE, PipelineParams, ResolutionPreset,
    default_output_path,
};
pub use run::{PipelineRun, RunReport, RunState};
pub use telemetry::{CancelToken, ProgressSnapshot, Telemetry};
