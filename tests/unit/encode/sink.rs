use super::*;
use crate::encode::writer::{Container, InMemoryWriter};
use crate::foundation::core::{Dimensions, Fps};
use crate::frame::PixelLayout;
use std::sync::atomic::AtomicUsize;
use std::time::Instant;

fn cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        dimensions: Dimensions::new(w, h),
        fps: Fps::FALLBACK,
        layout: PixelLayout::Rgb8,
        container: Container::Mp4,
    }
}

fn frame(v: u8) -> Frame {
    Frame::filled(4, 4, PixelLayout::Rgb8, [v, v, v])
}

struct GatedWriter {
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
    committed: usize,
}

impl FrameWriter for GatedWriter {
    fn begin(&mut self, _cfg: SinkConfig) -> TrailResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _frame: &Frame) -> TrailResult<()> {
        let _ = self.entered.send(());
        self.release
            .recv()
            .map_err(|_| TrailError::commit("gate closed"))?;
        self.committed += 1;
        Ok(())
    }

    fn end(&mut self) -> TrailResult<()> {
        Ok(())
    }
}

#[test]
fn stop_then_join_commits_everything_submitted() {
    let mut w = InMemoryWriter::new();
    let committed = std::thread::scope(|s| {
        let mut sink = EncodeSink::start(s, &mut w, cfg(4, 4), EncodeSinkOpts::default()).unwrap();
        for i in 0..7 {
            sink.submit(frame(i)).unwrap();
        }
        assert_eq!(sink.submitted(), 7);
        sink.request_stop();
        sink.join()
    })
    .unwrap();

    assert_eq!(committed, 7);
    assert_eq!(w.frames().len(), 7);
    assert_eq!(w.frames()[6].pixel(0, 0), [6, 6, 6]);
    assert!(w.is_ended());
    assert_eq!(w.config(), Some(cfg(4, 4)));
}

#[test]
fn submit_after_stop_is_rejected() {
    let mut w = InMemoryWriter::new();
    std::thread::scope(|s| {
        let mut sink = EncodeSink::start(s, &mut w, cfg(4, 4), EncodeSinkOpts::default()).unwrap();
        sink.submit(frame(1)).unwrap();
        sink.request_stop();
        assert!(matches!(sink.submit(frame(2)), Err(TrailError::Contract(_))));
        assert_eq!(sink.join().unwrap(), 1);
    });
    assert_eq!(w.frames().len(), 1);
}

#[test]
fn full_queue_blocks_the_producer() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let mut w = GatedWriter {
        entered: entered_tx,
        release: release_rx,
        committed: 0,
    };
    let accepted = AtomicUsize::new(0);
    let opts = EncodeSinkOpts {
        capacity: 2,
        ..EncodeSinkOpts::default()
    };

    let (accepted_while_blocked, result) = std::thread::scope(|s| {
        let mut sink = EncodeSink::start(s, &mut w, cfg(4, 4), opts).unwrap();
        let accepted = &accepted;
        let producer = s.spawn(move || {
            for i in 0..5 {
                sink.submit(frame(i))?;
                accepted.fetch_add(1, Ordering::SeqCst);
            }
            sink.join()
        });

        // The worker holds one frame inside the writer; the queue holds `capacity` more.
        entered_rx.recv().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while accepted.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        std::thread::sleep(Duration::from_millis(150));
        let seen = accepted.load(Ordering::SeqCst);

        for _ in 0..5 {
            release_tx.send(()).unwrap();
        }
        (seen, producer.join().unwrap())
    });

    assert_eq!(accepted_while_blocked, 3);
    assert_eq!(result.unwrap(), 5);
    assert_eq!(w.committed, 5);
}

#[test]
fn commit_failure_is_fatal_and_closes_output() {
    let mut w = InMemoryWriter::failing_after(2);
    let result = std::thread::scope(|s| {
        let mut sink = EncodeSink::start(s, &mut w, cfg(4, 4), EncodeSinkOpts::default()).unwrap();
        for i in 0..40 {
            if sink.submit(frame(i)).is_err() {
                break;
            }
        }
        sink.join()
    });

    assert!(matches!(result, Err(TrailError::Commit(_))));
    assert_eq!(w.frames().len(), 2);
    assert!(w.is_ended());
}

#[test]
fn worker_normalizes_to_target_height() {
    let mut w = InMemoryWriter::new();
    let opts = EncodeSinkOpts {
        target_height: 2,
        ..EncodeSinkOpts::default()
    };
    std::thread::scope(|s| {
        let mut sink = EncodeSink::start(s, &mut w, cfg(2, 2), opts).unwrap();
        sink.submit(frame(9)).unwrap();
        sink.join().unwrap();
    });
    let out = &w.frames()[0];
    assert_eq!(out.dimensions(), Dimensions::new(2, 2));
    assert_eq!(out.pixel(1, 1), [9, 9, 9]);
}

#[test]
fn idle_worker_exits_after_stop() {
    let mut w = InMemoryWriter::new();
    let opts = EncodeSinkOpts {
        poll_interval: Duration::from_millis(5),
        ..EncodeSinkOpts::default()
    };
    let committed = std::thread::scope(|s| {
        let sink = EncodeSink::start(s, &mut w, cfg(4, 4), opts).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        sink.join()
    })
    .unwrap();
    assert_eq!(committed, 0);
    assert!(w.is_ended());
}
