use super::*;

#[test]
fn fps_validation_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(25, 1).unwrap().as_f64(), 25.0);
}

#[test]
fn fps_parses_ffprobe_ratios() {
    assert_eq!(Fps::parse_ratio("30000/1001"), Some(Fps { num: 30000, den: 1001 }));
    assert_eq!(Fps::parse_ratio("24"), Some(Fps { num: 24, den: 1 }));
    assert_eq!(Fps::parse_ratio("0/0"), None);
    assert_eq!(Fps::parse_ratio("abc"), None);
}

#[test]
fn fps_display_collapses_integer_rates() {
    assert_eq!(Fps::new(30, 1).unwrap().to_string(), "30");
    assert_eq!(Fps::new(30000, 1001).unwrap().to_string(), "30000/1001");
}

#[test]
fn secs_to_frames_rounds_to_nearest() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert_eq!(fps.secs_to_frames_round(10.01), 300);
}

#[test]
fn dimensions_evenness() {
    assert!(Dimensions::new(100, 100).is_even());
    assert!(!Dimensions::new(101, 100).is_even());
    assert!(!Dimensions::new(100, 99).is_even());
    assert!(Dimensions::new(0, 4).is_empty());
}
