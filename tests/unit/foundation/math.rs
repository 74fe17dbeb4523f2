use super::*;

#[test]
fn scale_channel_rounds_to_nearest() {
    assert_eq!(scale_channel(100, 0.55), 55);
    assert_eq!(scale_channel(101, 0.5), 51); // 50.5 rounds away from zero
    assert_eq!(scale_channel(255, 1.0), 255);
    assert_eq!(scale_channel(0, 0.3), 0);
}

#[test]
fn scale_channel_saturates() {
    assert_eq!(scale_channel(200, 2.0), 255);
    assert_eq!(scale_channel(200, -1.0), 0);
    assert_eq!(scale_channel(200, f32::NAN), 0);
}

#[test]
fn linspace_hits_both_endpoints() {
    let w = linspace(0.55, 1.0, 3);
    assert_eq!(w.len(), 3);
    assert!((w[0] - 0.55).abs() < 1e-6);
    assert!((w[1] - 0.775).abs() < 1e-6);
    assert_eq!(w[2], 1.0);
}

#[test]
fn linspace_small_sizes() {
    assert!(linspace(0.2, 1.0, 0).is_empty());
    assert_eq!(linspace(0.2, 1.0, 1), vec![1.0]);
}

#[test]
fn lut_matches_direct_scaling() {
    for w in [0.05f32, 0.3, 0.775, 1.0] {
        let lut = ScaleLut::new(w);
        for v in 0..=255u8 {
            assert_eq!(lut.apply(v), scale_channel(v, w));
        }
    }
    assert!(ScaleLut::new(1.0).is_identity());
    assert!(!ScaleLut::new(0.99).is_identity());
}
