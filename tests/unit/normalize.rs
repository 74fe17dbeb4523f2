use super::*;
use crate::frame::PixelLayout;
use proptest::prelude::*;

fn dims(w: u32, h: u32) -> Dimensions {
    Dimensions::new(w, h)
}

#[test]
fn zero_or_taller_target_keeps_source_size() {
    assert_eq!(target_dimensions(dims(1920, 1080), 0), dims(1920, 1080));
    assert_eq!(target_dimensions(dims(1920, 1080), 1080), dims(1920, 1080));
    assert_eq!(target_dimensions(dims(1920, 1080), 2160), dims(1920, 1080));
}

#[test]
fn downscale_follows_aspect_ratio() {
    assert_eq!(target_dimensions(dims(3840, 2160), 1080), dims(1920, 1080));
    assert_eq!(target_dimensions(dims(1920, 1080), 720), dims(1280, 720));
}

#[test]
fn odd_width_is_decremented() {
    // 102 * 0.5 = 51 -> 50
    assert_eq!(target_dimensions(dims(102, 100), 50), dims(50, 50));
}

#[test]
fn odd_target_height_is_decremented() {
    assert_eq!(target_dimensions(dims(400, 200), 101), dims(202, 100));
}

#[test]
fn identity_returns_frame_untouched() {
    let f = Frame::filled(6, 4, PixelLayout::Bgr8, [1, 2, 3]);
    assert_eq!(normalize(f.clone(), 0), f);
    assert_eq!(normalize(f.clone(), 4), f);
    assert_eq!(normalize(f.clone(), 100), f);
}

#[test]
fn identity_path_crops_odd_sources() {
    let f = Frame::black(7, 5, PixelLayout::Rgb8);
    assert_eq!(normalize(f, 0).dimensions(), dims(6, 4));
}

#[test]
fn uniform_color_survives_downscale() {
    let f = Frame::filled(30, 20, PixelLayout::Rgb8, [200, 17, 255]);
    let out = normalize(f, 7);
    assert_eq!(out.dimensions(), dims(10, 6));
    assert!(out.rows().all(|row| row.chunks_exact(3).all(|px| px == [200, 17, 255])));
}

#[test]
fn half_scale_averages_blocks() {
    let mut f = Frame::black(4, 4, PixelLayout::Rgb8);
    f.set_pixel(0, 0, [10, 0, 0]);
    f.set_pixel(1, 0, [20, 0, 0]);
    f.set_pixel(0, 1, [30, 0, 0]);
    f.set_pixel(1, 1, [40, 0, 0]);
    f.set_pixel(3, 3, [0, 0, 100]);
    let out = normalize(f, 2);
    assert_eq!(out.dimensions(), dims(2, 2));
    assert_eq!(out.pixel(0, 0), [25, 0, 0]);
    assert_eq!(out.pixel(1, 1), [0, 0, 25]);
    assert_eq!(out.pixel(1, 0), [0, 0, 0]);
}

#[test]
fn layout_is_preserved() {
    let f = Frame::filled(8, 8, PixelLayout::Bgr8, [5, 6, 7]);
    assert_eq!(normalize(f, 4).layout(), PixelLayout::Bgr8);
}

#[test]
fn output_never_exceeds_a_narrow_source() {
    assert_eq!(target_dimensions(dims(3, 64), 40), dims(2, 40));
    assert_eq!(target_dimensions(dims(2, 64), 2), dims(2, 2));
    let out = normalize(Frame::filled(3, 64, PixelLayout::Rgb8, [9, 9, 9]), 40);
    assert_eq!(out.dimensions(), dims(2, 40));
}

#[test]
fn sub_two_pixel_sources_are_never_upscaled() {
    assert_eq!(target_dimensions(dims(1, 5), 0), dims(0, 4));
    assert_eq!(target_dimensions(dims(1, 5), 2), dims(0, 4));
    assert_eq!(target_dimensions(dims(9, 1), 0), dims(8, 0));
    let out = normalize(Frame::filled(1, 5, PixelLayout::Rgb8, [1, 2, 3]), 2);
    assert_eq!(out.dimensions(), dims(0, 4));
}

proptest! {
    #[test]
    fn normalized_output_is_even_smaller_and_stable(
        w in 1u32..64,
        h in 1u32..64,
        target in 0u32..80,
    ) {
        let f = Frame::filled(w, h, PixelLayout::Rgb8, [40, 80, 120]);
        let once = normalize(f, target);
        let d = once.dimensions();
        prop_assert!(d.is_even());
        prop_assert!(d.width <= w && d.height <= h);
        prop_assert_eq!(d, target_dimensions(Dimensions::new(w, h), target));

        let twice = normalize(once.clone(), target);
        prop_assert_eq!(twice, once);
    }
}
