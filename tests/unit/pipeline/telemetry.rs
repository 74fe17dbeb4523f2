use super::*;
use crate::frame::PixelLayout;

#[test]
fn snapshot_fps_is_frames_over_elapsed() {
    let s = ProgressSnapshot::measure(50, 100, Duration::from_secs(2));
    assert_eq!(s.fps, 25.0);
    assert_eq!(s.fraction(), Some(0.5));
}

#[test]
fn zero_elapsed_reports_no_throughput() {
    let s = ProgressSnapshot::measure(1, 0, Duration::ZERO);
    assert_eq!(s.fps, 0.0);
    assert_eq!(ProgressSnapshot::measure(1, 10, Duration::ZERO).fps, 0.0);
    assert_eq!(s.fraction(), None);
}

#[test]
fn callbacks_receive_events() {
    let mut seen = Vec::new();
    let mut previews = 0;
    {
        let mut t = Telemetry::none()
            .on_progress(|s| seen.push(s.frames_done))
            .on_preview(|_, _| previews += 1);
        assert!(t.wants_preview());
        t.emit_progress(ProgressSnapshot::measure(1, 2, Duration::from_millis(10)));
        t.emit_progress(ProgressSnapshot::measure(2, 2, Duration::from_millis(20)));
        t.emit_preview(0, Frame::black(2, 2, PixelLayout::Rgb8));
    }
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(previews, 1);
}

#[test]
fn cancel_is_shared_between_clones() {
    let a = CancelToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    a.cancel();
    assert!(b.is_cancelled());
}
