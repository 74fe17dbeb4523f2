use std::path::{Path, PathBuf};

use crate::encode::writer::Container;
use crate::foundation::error::{TrailError, TrailResult};

/// Default trail length in frames.
pub const DEFAULT_TRAIL_LENGTH: u32 = 120;
/// Default fade amount.
pub const DEFAULT_FADE: f32 = 0.8;
/// Largest accepted fade amount.
pub const MAX_FADE: f32 = 0.99;

/// Named output heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPreset {
    /// Keep the source resolution.
    #[default]
    Original,
    /// 2160 rows.
    Uhd,
    /// 1080 rows.
    Fhd,
    /// 720 rows.
    Hd,
}

impl ResolutionPreset {
    /// Target height for the normalizer; `0` means no rescale.
    pub fn height(self) -> u32 {
        match self {
            Self::Original => 0,
            Self::Uhd => 2160,
            Self::Fhd => 1080,
            Self::Hd => 720,
        }
    }
}

fn default_trail_length() -> u32 {
    DEFAULT_TRAIL_LENGTH
}

fn default_fade() -> f32 {
    DEFAULT_FADE
}

/// Immutable configuration for one pipeline run.
///
/// Build it with [`PipelineParams::new`] or load it with [`PipelineParams::from_json_path`],
/// then hand it to [`crate::PipelineRun::new`], which validates it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineParams {
    /// Source video.
    pub input: PathBuf,
    /// Destination video. Empty in a parameter file means "derive from the input name".
    #[serde(default)]
    pub output: PathBuf,
    /// Trail length in frames; also picks the algorithm (see [`crate::TrailMode::select`]).
    #[serde(default = "default_trail_length")]
    pub trail_length: u32,
    /// Fade amount in `[0, 0.99]`; larger means older frames fade more.
    #[serde(default = "default_fade")]
    pub fade: f32,
    /// Output height; `0` keeps the source resolution.
    #[serde(default)]
    pub target_height: u32,
    /// Output container.
    #[serde(default)]
    pub container: Container,
}

impl PipelineParams {
    /// Parameters with default trail settings and no rescale.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            trail_length: DEFAULT_TRAIL_LENGTH,
            fade: DEFAULT_FADE,
            target_height: 0,
            container: Container::default(),
        }
    }

    /// Load parameters from a JSON file.
    ///
    /// Relative `input`/`output` paths resolve against the file's directory. A missing
    /// output is derived with [`default_output_path`].
    pub fn from_json_path(path: &Path) -> TrailResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TrailError::config(format!("failed to read params '{}': {e}", path.display()))
        })?;
        let mut params: Self = serde_json::from_str(&text).map_err(|e| {
            TrailError::config(format!("failed to parse params '{}': {e}", path.display()))
        })?;

        let base = path.parent().unwrap_or(Path::new(""));
        if params.input.is_relative() {
            params.input = base.join(&params.input);
        }
        if params.output.as_os_str().is_empty() {
            params.output =
                default_output_path(&params.input, params.target_height, params.container);
        } else if params.output.is_relative() {
            params.output = base.join(&params.output);
        }
        Ok(params)
    }

    /// Reject out-of-range or inconsistent parameters.
    pub fn validate(&self) -> TrailResult<()> {
        if self.input.as_os_str().is_empty() {
            return Err(TrailError::config("input path must not be empty"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(TrailError::config("output path must not be empty"));
        }
        if self.trail_length < 1 {
            return Err(TrailError::config("trail_length must be >= 1"));
        }
        if !self.fade.is_finite() || !(0.0..=MAX_FADE).contains(&self.fade) {
            return Err(TrailError::config(format!(
                "fade must be in [0, {MAX_FADE}], got {}",
                self.fade
            )));
        }
        if self.input == self.output {
            return Err(TrailError::config(format!(
                "output '{}' would overwrite the input",
                self.output.display()
            )));
        }
        Ok(())
    }
}

/// `<stem>_StarTrail_<height>p.<ext>` (or `_StarTrail_Original` without rescale), next to
/// `input`.
pub fn default_output_path(input: &Path, target_height: u32, container: Container) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    let tag = if target_height == 0 {
        "Original".to_owned()
    } else {
        format!("{target_height}p")
    };
    let name = format!("{stem}_StarTrail_{tag}.{}", container.extension());
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/params.rs"]
mod tests;
