use super::*;

#[test]
fn container_from_path_is_case_insensitive() {
    assert_eq!(Container::from_path(Path::new("a/b.MP4")), Some(Container::Mp4));
    assert_eq!(Container::from_path(Path::new("clip.mov")), Some(Container::Mov));
    assert_eq!(Container::from_path(Path::new("clip.avi")), None);
    assert_eq!(Container::from_path(Path::new("noext")), None);
}

#[test]
fn container_uses_lowercase_json_names() {
    let c: Container = serde_json::from_str("\"mov\"").unwrap();
    assert_eq!(c, Container::Mov);
    assert_eq!(serde_json::to_string(&Container::Mp4).unwrap(), "\"mp4\"");
}

#[test]
fn in_memory_writer_records_lifecycle() {
    let mut w = InMemoryWriter::new();
    let cfg = SinkConfig {
        dimensions: Dimensions::new(2, 2),
        fps: Fps::FALLBACK,
        layout: PixelLayout::Rgb8,
        container: Container::Mp4,
    };
    w.begin(cfg).unwrap();
    w.push_frame(&Frame::black(2, 2, PixelLayout::Rgb8)).unwrap();
    assert!(!w.is_ended());
    w.end().unwrap();
    assert!(w.is_ended());
    assert_eq!(w.frames().len(), 1);
    assert_eq!(w.config(), Some(cfg));
}

#[test]
fn failing_writer_refuses_after_limit() {
    let mut w = InMemoryWriter::failing_after(1);
    let f = Frame::black(2, 2, PixelLayout::Rgb8);
    w.push_frame(&f).unwrap();
    assert!(matches!(w.push_frame(&f), Err(TrailError::Commit(_))));
}
