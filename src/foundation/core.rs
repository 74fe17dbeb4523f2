use crate::foundation::error::{TrailError, TrailResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Frame rate assumed when a source does not report a usable one.
    pub const FALLBACK: Fps = Fps { num: 30, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> TrailResult<Self> {
        if den == 0 {
            return Err(TrailError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(TrailError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse an ffmpeg-style ratio such as `30000/1001` or a bare integer.
    ///
    /// Returns `None` for zero or malformed ratios (ffprobe reports `0/0` for unknown rates).
    pub fn parse_ratio(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('/');
        let num = parts.next()?.parse::<u32>().ok()?;
        let den = match parts.next() {
            Some(d) => d.parse::<u32>().ok()?,
            None => 1,
        };
        Self::new(num, den).ok()
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert a duration in seconds to a frame count, rounding to nearest.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Pixel dimensions of a frame or output stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a dimensions value.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when both sides are even (required for yuv420p output).
    pub fn is_even(self) -> bool {
        self.width.is_multiple_of(2) && self.height.is_multiple_of(2)
    }

    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
