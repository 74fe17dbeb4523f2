use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread::{Scope, ScopedJoinHandle};
use std::time::Duration;

use crate::encode::writer::{FrameWriter, SinkConfig};
use crate::foundation::error::{TrailError, TrailResult};
use crate::frame::Frame;
use crate::normalize::normalize;

/// Frames that may be in flight between the pipeline and the encoder.
pub const QUEUE_CAPACITY: usize = 30;
/// How long the worker waits on an empty queue before re-checking whether to stop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning for [`EncodeSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSinkOpts {
    /// Bounded queue capacity. `submit` blocks when this many frames are waiting.
    pub capacity: usize,
    /// Idle poll timeout of the worker.
    pub poll_interval: Duration,
    /// Output height passed to [`normalize`]; `0` keeps the source size.
    pub target_height: u32,
}

impl Default for EncodeSinkOpts {
    fn default() -> Self {
        Self {
            capacity: QUEUE_CAPACITY,
            poll_interval: POLL_INTERVAL,
            target_height: 0,
        }
    }
}

/// Bounded hand-off from the compositing loop to a [`FrameWriter`] running on its own thread.
///
/// The worker normalizes each frame to the output resolution and commits it. Submitting
/// into a full queue blocks, which throttles the producer to the encoder's pace. After
/// [`EncodeSink::request_stop`] the worker still drains every queued frame before it
/// finalizes the stream.
pub struct EncodeSink<'scope> {
    tx: Option<SyncSender<Frame>>,
    active: Arc<AtomicBool>,
    worker: ScopedJoinHandle<'scope, TrailResult<u64>>,
    submitted: u64,
}

impl<'scope> EncodeSink<'scope> {
    /// Open the output stream and start the worker on `scope`.
    ///
    /// `writer.begin` runs on the calling thread, so an output that cannot be opened fails
    /// here before any frame is produced.
    pub fn start<'env>(
        scope: &'scope Scope<'scope, 'env>,
        writer: &'scope mut dyn FrameWriter,
        cfg: SinkConfig,
        opts: EncodeSinkOpts,
    ) -> TrailResult<Self> {
        writer.begin(cfg)?;

        let (tx, rx) = mpsc::sync_channel::<Frame>(opts.capacity);
        let active = Arc::new(AtomicBool::new(true));
        let worker_active = Arc::clone(&active);

        let worker = scope.spawn(move || -> TrailResult<u64> {
            tracing::debug!(capacity = opts.capacity, "encode worker started");
            let mut committed = 0u64;
            loop {
                match rx.recv_timeout(opts.poll_interval) {
                    Ok(frame) => {
                        let frame = normalize(frame, opts.target_height);
                        if let Err(e) = writer.push_frame(&frame) {
                            drop(rx);
                            if let Err(end_err) = writer.end() {
                                tracing::warn!("closing output after commit failure: {end_err}");
                            }
                            return Err(e);
                        }
                        committed += 1;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if !worker_active.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            writer.end()?;
            tracing::debug!(committed, "encode worker drained");
            Ok(committed)
        });

        Ok(Self {
            tx: Some(tx),
            active,
            worker,
            submitted: 0,
        })
    }

    /// Hand `frame` to the worker, blocking while the queue is full.
    ///
    /// Fails with a contract error after [`EncodeSink::request_stop`], and with a commit error
    /// once the worker has stopped on a commit failure.
    pub fn submit(&mut self, frame: Frame) -> TrailResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(TrailError::contract("submit after the encode sink was stopped"));
        };
        tx.send(frame)
            .map_err(|_| TrailError::commit("encode worker is not accepting frames"))?;
        self.submitted += 1;
        Ok(())
    }

    /// Signal that no more frames will be submitted. Queued frames are still committed.
    pub fn request_stop(&mut self) {
        self.active.store(false, Ordering::Release);
        self.tx = None;
    }

    /// Frames accepted by `submit` so far.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Wait for the worker to drain the queue and release the stream.
    ///
    /// Returns the number of committed frames, or the first commit failure.
    pub fn join(mut self) -> TrailResult<u64> {
        self.request_stop();
        self.worker
            .join()
            .map_err(|_| TrailError::commit("encode worker panicked"))?
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
