//! Output-resolution normalization.
//!
//! Frames are downscaled (never upscaled) to a target height with area averaging, and
//! both output dimensions are forced even so H.264/yuv420p encoders accept them.

use rayon::prelude::*;

use crate::foundation::core::Dimensions;
use crate::frame::{CHANNELS, Frame};

/// Output size for a `source` frame at `target_height`.
///
/// `0`, or any target at or above the source height, keeps the source size (cropped down to
/// even). Otherwise the width follows the aspect ratio, rounded to nearest; odd results are
/// decremented by one. Neither side drops below 2 pixels or grows past the source.
///
/// Sources narrower or shorter than 2 pixels have no even output size; their short side
/// becomes `0`.
pub fn target_dimensions(source: Dimensions, target_height: u32) -> Dimensions {
    let cropped = Dimensions::new(even_floor(source.width), even_floor(source.height));
    if keeps_source_size(source, target_height) {
        return cropped;
    }
    let ratio = f64::from(target_height) / f64::from(source.height);
    let width = (f64::from(source.width) * ratio).round() as u32;
    Dimensions::new(
        even_at_least_two(width).min(cropped.width),
        even_at_least_two(target_height),
    )
}

fn keeps_source_size(source: Dimensions, target_height: u32) -> bool {
    target_height == 0
        || source.width < 2
        || source.height < 2
        || even_at_least_two(target_height) >= source.height
}

fn even_floor(v: u32) -> u32 {
    v - v % 2
}

fn even_at_least_two(v: u32) -> u32 {
    (v - v % 2).max(2)
}

/// Map `frame` to the output resolution for `target_height`.
///
/// When no rescale applies (`target_height` is `0` or not below the source height) this is
/// the identity for even-sized frames only: an odd width or height loses its last column or
/// row, since yuv420p encoders reject odd sizes.
///
/// Idempotent: a normalized frame normalized again at the same target is returned unchanged.
pub fn normalize(frame: Frame, target_height: u32) -> Frame {
    let src = frame.dimensions();
    if keeps_source_size(src, target_height) {
        return frame.crop_to_even();
    }
    resize_area(&frame, target_dimensions(src, target_height))
}

/// Area-averaging resize: each output pixel is the coverage-weighted mean of the source
/// pixels under its footprint.
pub fn resize_area(src: &Frame, dst: Dimensions) -> Frame {
    if dst.is_empty() || src.dimensions().is_empty() {
        return Frame::black(dst.width, dst.height, src.layout());
    }
    let xs = area_taps(src.width(), dst.width);
    let ys = area_taps(src.height(), dst.height);
    let src_row_bytes = src.row_bytes();
    let dst_row_bytes = dst.width as usize * CHANNELS;

    let mut data = vec![0u8; dst_row_bytes * dst.height as usize];
    data.par_chunks_mut(dst_row_bytes)
        .zip(ys.par_iter())
        .for_each(|(out_row, y_taps)| {
            let mut line = vec![0f32; src_row_bytes];
            for &(sy, wy) in y_taps {
                for (acc, &v) in line.iter_mut().zip(src.row(sy as u32)) {
                    *acc += f32::from(v) * wy;
                }
            }
            for (out_px, x_taps) in out_row.chunks_exact_mut(CHANNELS).zip(&xs) {
                let mut sum = [0f32; CHANNELS];
                for &(sx, wx) in x_taps {
                    let px = &line[sx * CHANNELS..sx * CHANNELS + CHANNELS];
                    for c in 0..CHANNELS {
                        sum[c] += px[c] * wx;
                    }
                }
                for c in 0..CHANNELS {
                    out_px[c] = sum[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    Frame::from_packed(dst.width, dst.height, src.layout(), data)
}

/// Per-output-index source taps `(index, weight)` for a 1-D area resample; weights sum to 1.
fn area_taps(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|o| {
            let start = f64::from(o) * scale;
            let end = (start + scale).min(f64::from(src_len));
            let mut taps = Vec::with_capacity(scale.ceil() as usize + 1);
            let mut i = start.floor() as usize;
            while (i as f64) < end {
                let lo = start.max(i as f64);
                let hi = end.min(i as f64 + 1.0);
                let cover = hi - lo;
                if cover > 1e-9 {
                    taps.push((i, (cover / scale) as f32));
                }
                i += 1;
            }
            taps
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/normalize.rs"]
mod tests;
