use crate::foundation::math::ScaleLut;
use crate::frame::Frame;

fn assert_same_shape(dst: &Frame, src: &Frame) {
    assert!(
        dst.same_shape(src),
        "compositing requires frames of identical shape: {}x{} vs {}x{}",
        dst.width(),
        dst.height(),
        src.width(),
        src.height()
    );
}

/// `dst = max(dst, src)` per pixel and channel.
pub fn max_in_place(dst: &mut Frame, src: &Frame) {
    assert_same_shape(dst, src);
    for y in 0..src.height() {
        for (d, s) in dst.row_mut(y).iter_mut().zip(src.row(y)) {
            if *s > *d {
                *d = *s;
            }
        }
    }
}

/// `dst = src * weight` per channel, saturating and rounded.
pub fn scale_into(dst: &mut Frame, src: &Frame, lut: &ScaleLut) {
    assert_same_shape(dst, src);
    for y in 0..src.height() {
        let drow = dst.row_mut(y);
        if lut.is_identity() {
            drow.copy_from_slice(src.row(y));
            continue;
        }
        for (d, s) in drow.iter_mut().zip(src.row(y)) {
            *d = lut.apply(*s);
        }
    }
}

/// `dst = max(dst, src * weight)` without materializing the scaled frame.
pub fn max_scaled_in_place(dst: &mut Frame, src: &Frame, lut: &ScaleLut) {
    if lut.is_identity() {
        max_in_place(dst, src);
        return;
    }
    assert_same_shape(dst, src);
    for y in 0..src.height() {
        for (d, s) in dst.row_mut(y).iter_mut().zip(src.row(y)) {
            let v = lut.apply(*s);
            if v > *d {
                *d = v;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/ops.rs"]
mod tests;
