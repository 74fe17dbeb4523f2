//! Cheap downsampled previews of composited frames.

use crate::frame::{CHANNELS, Frame, PixelLayout};

/// Every how many frames a preview is produced.
pub const PREVIEW_EVERY: u64 = 5;
/// Preview height in pixels.
pub const PREVIEW_HEIGHT: u32 = 360;

/// Decides which frames get a preview and renders it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewSampler {
    /// Sample when `index % every == 0`.
    pub every: u64,
    /// Output height; width follows the aspect ratio.
    pub height: u32,
}

impl Default for PreviewSampler {
    fn default() -> Self {
        Self {
            every: PREVIEW_EVERY,
            height: PREVIEW_HEIGHT,
        }
    }
}

impl PreviewSampler {
    /// `true` when the zero-based frame `index` should be previewed.
    pub fn is_due(&self, index: u64) -> bool {
        self.every != 0 && index.is_multiple_of(self.every)
    }

    /// Render a preview of `frame` if `index` is due.
    pub fn sample(&self, index: u64, frame: &Frame) -> Option<Frame> {
        self.is_due(index).then(|| self.render(frame))
    }

    /// Nearest-neighbour resize to `height` rows, converted to RGB channel order.
    pub fn render(&self, frame: &Frame) -> Frame {
        if frame.dimensions().is_empty() {
            return Frame::black(0, 0, PixelLayout::Rgb8);
        }
        let height = self.height.max(1);
        let width =
            ((u64::from(frame.width()) * u64::from(height)) / u64::from(frame.height())).max(1) as u32;

        let swap = frame.layout() == PixelLayout::Bgr8;
        let mut out = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            let sy = nearest(y, height, frame.height());
            let row = frame.row(sy);
            for x in 0..width {
                let sx = nearest(x, width, frame.width()) as usize * CHANNELS;
                let px = &row[sx..sx + CHANNELS];
                if swap {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                } else {
                    out.extend_from_slice(px);
                }
            }
        }
        Frame::from_packed(width, height, PixelLayout::Rgb8, out)
    }
}

fn nearest(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    ((u64::from(dst) * u64::from(src_len)) / u64::from(dst_len)).min(u64::from(src_len.saturating_sub(1)))
        as u32
}

#[cfg(test)]
#[path = "../tests/unit/preview.rs"]
mod tests;
