//! Owned three-channel 8-bit frames.

use crate::foundation::core::Dimensions;
use crate::foundation::error::{TrailError, TrailResult};

/// Bytes per pixel for every supported layout.
pub const CHANNELS: usize = 3;

/// Channel order of a [`Frame`]'s pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    /// Red, green, blue.
    #[default]
    Rgb8,
    /// Blue, green, red.
    Bgr8,
}

impl PixelLayout {
    /// The matching ffmpeg `-pix_fmt` name.
    pub fn ffmpeg_pix_fmt(self) -> &'static str {
        match self {
            Self::Rgb8 => "rgb24",
            Self::Bgr8 => "bgr24",
        }
    }
}

/// A 2-D grid of 3-channel pixels with an explicit row stride.
///
/// Rows are `stride` bytes apart; only the first `width * 3` bytes of each row are pixels.
/// Frames move by value through the pipeline; nothing holds two mutable owners of one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    /// A black, tightly packed frame.
    pub fn black(width: u32, height: u32, layout: PixelLayout) -> Self {
        let stride = width as usize * CHANNELS;
        Self {
            width,
            height,
            stride,
            layout,
            data: vec![0u8; stride * height as usize],
        }
    }

    /// A frame where every pixel has the same channel values.
    pub fn filled(width: u32, height: u32, layout: PixelLayout, px: [u8; 3]) -> Self {
        let mut f = Self::black(width, height, layout);
        for chunk in f.data.chunks_exact_mut(CHANNELS) {
            chunk.copy_from_slice(&px);
        }
        f
    }

    /// Wrap tightly packed pixel bytes (`width * height * 3`).
    pub fn from_raw(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> TrailResult<Self> {
        Self::from_raw_with_stride(width, height, width as usize * CHANNELS, layout, data)
    }

    /// Wrap a buffer that is exactly `width * height * 3` bytes.
    pub(crate) fn from_packed(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * CHANNELS * height as usize);
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            layout,
            data,
        }
    }

    /// Wrap pixel bytes whose rows are `stride` bytes apart.
    pub fn from_raw_with_stride(
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> TrailResult<Self> {
        let row_bytes = width as usize * CHANNELS;
        if stride < row_bytes {
            return Err(TrailError::config(format!(
                "frame stride {stride} is smaller than one row ({row_bytes} bytes)"
            )));
        }
        let needed = if height == 0 {
            0
        } else {
            stride * (height as usize - 1) + row_bytes
        };
        if data.len() < needed {
            return Err(TrailError::config(format!(
                "frame buffer too small: got {} bytes, need {needed} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            layout,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height together.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Channel order.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Bytes of pixel data in one row (`width * 3`).
    pub fn row_bytes(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Pixel bytes of row `y`, without stride padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable pixel bytes of row `y`, without stride padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let len = self.row_bytes();
        &mut self.data[start..start + len]
    }

    /// Iterate over rows as pixel slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Channel values at `(x, y)` in this frame's layout order.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let off = x as usize * CHANNELS;
        let row = self.row(y);
        [row[off], row[off + 1], row[off + 2]]
    }

    /// Overwrite the channel values at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 3]) {
        let off = x as usize * CHANNELS;
        self.row_mut(y)[off..off + CHANNELS].copy_from_slice(&px);
    }

    /// `true` when `other` has the same width, height, and layout.
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.layout == other.layout
    }

    /// Return a tightly packed copy of the pixels (no stride padding).
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        if self.stride == self.row_bytes() {
            return self.data[..self.row_bytes() * self.height as usize].to_vec();
        }
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }

    /// Convert to `layout`, swapping the first and third channel when needed.
    pub fn into_layout(mut self, layout: PixelLayout) -> Frame {
        if self.layout == layout {
            return self;
        }
        for y in 0..self.height {
            for px in self.row_mut(y).chunks_exact_mut(CHANNELS) {
                px.swap(0, 2);
            }
        }
        self.layout = layout;
        self
    }

    /// Drop the last column and/or row so both dimensions are even.
    ///
    /// Returns the frame unchanged when it is already even.
    pub fn crop_to_even(self) -> Frame {
        let w = self.width - self.width % 2;
        let h = self.height - self.height % 2;
        if w == self.width && h == self.height {
            return self;
        }
        let mut out = Frame::black(w, h, self.layout);
        let len = out.row_bytes();
        for y in 0..h {
            out.row_mut(y).copy_from_slice(&self.row(y)[..len]);
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/unit/frame.rs"]
mod tests;
