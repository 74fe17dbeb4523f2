use std::collections::VecDeque;

use crate::composite::ops::{max_in_place, max_scaled_in_place, scale_into};
use crate::foundation::math::{ScaleLut, linspace};
use crate::frame::Frame;

/// Lowest weight the oldest frame of a fading trail can receive.
pub const MIN_FADE_WEIGHT: f32 = 0.05;

/// Trail algorithm, fixed once per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrailMode {
    /// Per-pixel maximum over every frame seen so far.
    RunningMax,
    /// Weighted maximum over the last `trail_length` frames, older frames dimmer.
    WindowedFade {
        /// Ring capacity and weight-table length.
        trail_length: usize,
        /// Fade amount in `[0, 0.99]`.
        fade: f32,
    },
}

impl TrailMode {
    /// Pick the trail algorithm for a run.
    ///
    /// A trail at least as long as the whole clip degenerates to a classic long exposure,
    /// so `trail_length >= total_frames` selects [`TrailMode::RunningMax`]. A total of `0`
    /// (unknown length) therefore also selects it.
    pub fn select(trail_length: u32, fade: f32, total_frames: u64) -> Self {
        if u64::from(trail_length) >= total_frames {
            Self::RunningMax
        } else {
            Self::WindowedFade {
                trail_length: trail_length.max(1) as usize,
                fade,
            }
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RunningMax => "running-max",
            Self::WindowedFade { .. } => "windowed-fade",
        }
    }
}

impl std::fmt::Display for TrailMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunningMax => f.write_str("running-max"),
            Self::WindowedFade { trail_length, fade } => {
                write!(f, "windowed-fade(trail={trail_length}, fade={fade})")
            }
        }
    }
}

/// Ascending per-position weights for a fading trail, with one lookup table per weight.
///
/// Index `0` is the oldest ring slot. The last weight is always exactly `1.0`.
#[derive(Clone, Debug)]
pub struct WeightTable {
    weights: Vec<f32>,
    luts: Vec<ScaleLut>,
}

impl WeightTable {
    /// `linspace(max(0.05, 1 - fade), 1.0, trail_length)`.
    pub fn new(trail_length: usize, fade: f32) -> Self {
        let start = (1.0 - fade).max(MIN_FADE_WEIGHT);
        let weights = linspace(start, 1.0, trail_length);
        let luts = weights.iter().map(|&w| ScaleLut::new(w)).collect();
        Self { weights, luts }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// `true` for a zero-length table.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// All weights, oldest first.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// The last `n` lookup tables, right-aligned against a partially filled ring.
    pub fn tail(&self, n: usize) -> &[ScaleLut] {
        let n = n.min(self.luts.len());
        &self.luts[self.luts.len() - n..]
    }
}

#[derive(Debug)]
struct FadeRing {
    frames: VecDeque<Frame>,
    capacity: usize,
    weights: WeightTable,
    out: Option<Frame>,
}

impl FadeRing {
    fn new(capacity: usize, fade: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            weights: WeightTable::new(capacity, fade),
            out: None,
        }
    }

    fn push(&mut self, frame: Frame) -> &Frame {
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);

        let n = self.frames.len();
        if n == 1 {
            return &self.frames[0];
        }

        let luts = self.weights.tail(n);
        let oldest = &self.frames[0];
        let mut acc = match self.out.take() {
            Some(buf) if buf.same_shape(oldest) => buf,
            _ => Frame::black(oldest.width(), oldest.height(), oldest.layout()),
        };
        scale_into(&mut acc, oldest, &luts[0]);
        for (frame, lut) in self.frames.iter().zip(luts).skip(1) {
            max_scaled_in_place(&mut acc, frame, lut);
        }
        self.out.insert(acc)
    }

    fn current(&self) -> Option<&Frame> {
        if self.frames.len() == 1 {
            self.frames.front()
        } else {
            self.out.as_ref()
        }
    }
}

#[derive(Debug)]
enum TrailState {
    RunningMax { acc: Option<Frame> },
    WindowedFade(FadeRing),
}

/// Turns a stream of frames into a stream of trail composites.
///
/// Every input frame yields exactly one output frame. The returned reference stays valid
/// until the next call to [`Compositor::composite`]; clone it to keep it longer.
#[derive(Debug)]
pub struct Compositor {
    mode: TrailMode,
    state: TrailState,
    frames_seen: u64,
}

impl Compositor {
    /// Create an empty compositor for `mode`.
    pub fn new(mode: TrailMode) -> Self {
        let state = match mode {
            TrailMode::RunningMax => TrailState::RunningMax { acc: None },
            TrailMode::WindowedFade { trail_length, fade } => {
                TrailState::WindowedFade(FadeRing::new(trail_length, fade))
            }
        };
        Self {
            mode,
            state,
            frames_seen: 0,
        }
    }

    /// The algorithm this compositor runs.
    pub fn mode(&self) -> TrailMode {
        self.mode
    }

    /// Number of frames composited so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Feed the next frame and return the composite for it.
    ///
    /// # Panics
    ///
    /// Panics if `frame` does not have the same shape as the frames before it.
    pub fn composite(&mut self, frame: Frame) -> &Frame {
        self.frames_seen += 1;
        match &mut self.state {
            TrailState::RunningMax { acc } => {
                let next = match acc.take() {
                    Some(mut prev) => {
                        max_in_place(&mut prev, &frame);
                        prev
                    }
                    None => frame,
                };
                acc.insert(next)
            }
            TrailState::WindowedFade(ring) => ring.push(frame),
        }
    }

    /// The most recent composite, if any frame has been fed.
    pub fn current(&self) -> Option<&Frame> {
        match &self.state {
            TrailState::RunningMax { acc } => acc.as_ref(),
            TrailState::WindowedFade(ring) => ring.current(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/trail.rs"]
mod tests;
