use super::*;
use crate::foundation::math::scale_channel;
use crate::frame::PixelLayout;
use proptest::prelude::*;

fn solid(v: u8) -> Frame {
    Frame::filled(2, 2, PixelLayout::Rgb8, [v, v, v])
}

fn single(px: [u8; 3]) -> Frame {
    Frame::from_raw(1, 1, PixelLayout::Rgb8, px.to_vec()).unwrap()
}

#[test]
fn mode_selection_uses_trail_length_as_switch() {
    assert_eq!(TrailMode::select(120, 0.8, 100), TrailMode::RunningMax);
    assert_eq!(TrailMode::select(10, 0.8, 10), TrailMode::RunningMax);
    assert_eq!(TrailMode::select(1, 0.8, 0), TrailMode::RunningMax);
    assert_eq!(
        TrailMode::select(3, 0.5, 10),
        TrailMode::WindowedFade {
            trail_length: 3,
            fade: 0.5
        }
    );
}

#[test]
fn weight_table_is_ascending_and_ends_at_one() {
    let t = WeightTable::new(3, 0.5);
    assert_eq!(t.weights(), &[0.5, 0.75, 1.0]);

    for (len, fade) in [(2, 0.0), (7, 0.3), (120, 0.8), (31, 0.99)] {
        let t = WeightTable::new(len, fade);
        let w = t.weights();
        assert_eq!(w.len(), len);
        assert_eq!(w[len - 1], 1.0);
        assert!(w.windows(2).all(|p| p[0] <= p[1]), "{w:?}");
    }
}

#[test]
fn weight_table_floors_strong_fade() {
    let t = WeightTable::new(4, 0.99);
    assert_eq!(t.weights()[0], MIN_FADE_WEIGHT);
}

#[test]
fn no_fade_gives_flat_table() {
    let t = WeightTable::new(5, 0.0);
    assert!(t.weights().iter().all(|&w| w == 1.0));
}

#[test]
fn single_entry_table_is_identity() {
    let t = WeightTable::new(1, 0.8);
    assert_eq!(t.weights(), &[1.0]);
    assert!(t.tail(1)[0].is_identity());
}

#[test]
fn tail_is_right_aligned() {
    let t = WeightTable::new(4, 0.6);
    assert_eq!(t.tail(2).len(), 2);
    assert!(t.tail(2)[1].is_identity());
    assert_eq!(t.tail(9).len(), 4);
}

#[test]
fn running_max_first_output_is_first_frame() {
    let mut c = Compositor::new(TrailMode::RunningMax);
    let f = single([3, 200, 17]);
    assert_eq!(c.composite(f.clone()), &f);
}

#[test]
fn running_max_keeps_brightest_per_channel() {
    let mut c = Compositor::new(TrailMode::RunningMax);
    c.composite(single([10, 0, 0]));
    c.composite(single([0, 20, 0]));
    let out = c.composite(single([5, 5, 30])).clone();
    assert_eq!(out, single([10, 20, 30]));
    assert_eq!(c.current(), Some(&out));
    assert_eq!(c.frames_seen(), 3);
}

#[test]
fn windowed_fade_passes_through_first_frame() {
    let mut c = Compositor::new(TrailMode::WindowedFade {
        trail_length: 4,
        fade: 0.8,
    });
    let f = single([123, 45, 6]);
    assert_eq!(c.composite(f.clone()), &f);
}

#[test]
fn windowed_fade_weights_older_frames() {
    // trail 3, fade 0.5 -> weights [0.5, 0.75, 1.0]
    let mut c = Compositor::new(TrailMode::select(3, 0.5, 10));
    let inputs: Vec<Frame> = (1..=5u8).map(|i| single([i * 50, 255 - i * 40, 101])).collect();
    let mut last = None;
    for f in &inputs {
        last = Some(c.composite(f.clone()).clone());
    }

    let expect = |ch: usize| {
        let f3 = scale_channel(inputs[2].pixel(0, 0)[ch], 0.5);
        let f4 = scale_channel(inputs[3].pixel(0, 0)[ch], 0.75);
        let f5 = inputs[4].pixel(0, 0)[ch];
        f3.max(f4).max(f5)
    };
    let got = last.unwrap().pixel(0, 0);
    assert_eq!(got, [expect(0), expect(1), expect(2)]);
    // channel 1: 135*0.5 -> 68 (rounded), 95*0.75 -> 71, 55 -> max 71
    assert_eq!(got[1], 71);
}

#[test]
fn partially_filled_ring_uses_highest_weights() {
    let mut c = Compositor::new(TrailMode::select(4, 0.6, 100));
    // weights [0.4, 0.6, 0.8, 1.0]; two frames use [0.8, 1.0]
    c.composite(solid(100));
    let out = c.composite(solid(0));
    assert_eq!(out.pixel(1, 1), [80, 80, 80]);
}

#[test]
fn windowed_fade_evicts_old_frames() {
    let mut c = Compositor::new(TrailMode::select(2, 0.5, 100));
    c.composite(solid(250));
    let second = c.composite(solid(10)).pixel(0, 0);
    assert_eq!(second, [125, 125, 125]);
    let third = c.composite(solid(10)).pixel(0, 0);
    assert_eq!(third, [10, 10, 10]);
}

#[test]
fn flat_table_reduces_to_window_max() {
    let mut c = Compositor::new(TrailMode::select(3, 0.0, 100));
    c.composite(single([1, 90, 3]));
    c.composite(single([70, 2, 3]));
    let out = c.composite(single([4, 5, 60]));
    assert_eq!(out, &single([70, 90, 60]));
}

proptest! {
    #[test]
    fn running_max_is_monotone_and_bounds_inputs(
        frames in prop::collection::vec(prop::array::uniform3(any::<u8>()), 1..24)
    ) {
        let mut c = Compositor::new(TrailMode::RunningMax);
        let mut prev: Option<[u8; 3]> = None;
        for px in &frames {
            let out = c.composite(single(*px)).pixel(0, 0);
            for ch in 0..3 {
                prop_assert!(out[ch] >= px[ch]);
                if let Some(p) = prev {
                    prop_assert!(out[ch] >= p[ch]);
                }
            }
            prev = Some(out);
        }
        let expected: Vec<u8> = (0..3)
            .map(|ch| frames.iter().map(|p| p[ch]).max().unwrap())
            .collect();
        prop_assert_eq!(prev.unwrap().to_vec(), expected);
    }

    #[test]
    fn windowed_fade_never_exceeds_window_max(
        frames in prop::collection::vec(any::<u8>(), 1..20),
        trail in 1usize..6,
        fade in 0.0f32..0.99,
    ) {
        let mut c = Compositor::new(TrailMode::WindowedFade { trail_length: trail, fade });
        for (i, v) in frames.iter().enumerate() {
            let out = c.composite(single([*v, *v, *v])).pixel(0, 0)[0];
            let lo = i.saturating_sub(trail - 1);
            let window_max = frames[lo..=i].iter().copied().max().unwrap();
            prop_assert!(out <= window_max);
            prop_assert!(out >= *v);
        }
    }
}
