//! Bounded-wait reads on top of a blocking capture handle
//!
//! The wrapped handle moves onto a dedicated reader thread. Each `read` sends
//! one request and waits at most `timeout` for the answer. A read that misses
//! the deadline stays outstanding: the next `read` waits for that same result
//! rather than queueing another request, so results arrive in order and at
//! most one device read is ever in flight.

use crate::source::{Capture, CaptureError, CaptureId, ReadOutcome};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct TimedCapture {
    id: CaptureId,
    device_index: u32,
    timeout: Duration,
    requests: Option<Sender<()>>,
    results: Receiver<ReadOutcome>,
    // A request whose result has not been collected yet
    pending: bool,
    join_on_drop: bool,
    reader: Option<JoinHandle<()>>,
}

impl TimedCapture {
    pub fn new(mut capture: Box<dyn Capture>, timeout: Duration) -> Result<Self, CaptureError> {
        let id = capture.id();
        let device_index = capture.device_index();
        let (req_tx, req_rx) = channel::bounded::<()>(1);
        let (res_tx, res_rx) = channel::bounded::<ReadOutcome>(1);

        let reader = thread::Builder::new()
            .name("vision-capture-reader".to_string())
            .spawn(move || {
                for () in req_rx.iter() {
                    let outcome = capture.read();
                    if res_tx.send(outcome).is_err() {
                        break;
                    }
                }
                log::debug!("Capture reader for device {} exiting", device_index);
            })
            .map_err(CaptureError::ReaderSpawn)?;

        Ok(Self {
            id,
            device_index,
            timeout,
            requests: Some(req_tx),
            results: res_rx,
            pending: false,
            join_on_drop: false,
            reader: Some(reader),
        })
    }

    /// Make drop wait for an outstanding read instead of detaching the reader
    ///
    /// Needed when the wrapped handle borrows memory that its owner frees
    /// once the capture is gone.
    pub fn join_on_drop(mut self, join: bool) -> Self {
        self.join_on_drop = join;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a timed-out read is still outstanding
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl Capture for TimedCapture {
    fn read(&mut self) -> ReadOutcome {
        if !self.pending {
            let sent = self
                .requests
                .as_ref()
                .map(|tx| tx.send(()).is_ok())
                .unwrap_or(false);
            if !sent {
                return ReadOutcome::Transient;
            }
            self.pending = true;
        }

        match self.results.recv_timeout(self.timeout) {
            Ok(outcome) => {
                self.pending = false;
                outcome
            }
            Err(RecvTimeoutError::Timeout) => ReadOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => {
                // Reader thread is gone (the device read panicked)
                self.pending = false;
                ReadOutcome::Transient
            }
        }
    }

    fn id(&self) -> CaptureId {
        self.id
    }

    fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl Drop for TimedCapture {
    fn drop(&mut self) {
        // Closing the request channel ends the reader loop
        self.requests.take();

        if let Some(handle) = self.reader.take() {
            if self.pending && !self.join_on_drop {
                // The in-flight read may never return; the reader drops the
                // device once it does
                log::warn!(
                    "Detaching capture reader for device {} with a read in flight",
                    self.device_index
                );
            } else {
                if self.pending {
                    log::debug!(
                        "Waiting for in-flight read on device {} before closing",
                        self.device_index
                    );
                }
                handle.join().ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use vision_frame::Frame;

    /// Blocks each read until the test releases a frame
    struct GatedCapture {
        id: CaptureId,
        gate: Receiver<u8>,
        dropped: Arc<AtomicBool>,
    }

    impl Capture for GatedCapture {
        fn read(&mut self) -> ReadOutcome {
            match self.gate.recv() {
                Ok(value) => ReadOutcome::Frame(Frame::filled(1, 1, 3, value).unwrap()),
                Err(_) => ReadOutcome::Transient,
            }
        }

        fn id(&self) -> CaptureId {
            self.id
        }

        fn device_index(&self) -> u32 {
            7
        }
    }

    impl Drop for GatedCapture {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn gated() -> (Box<dyn Capture>, Sender<u8>, Arc<AtomicBool>) {
        let (tx, rx) = channel::unbounded();
        let dropped = Arc::new(AtomicBool::new(false));
        let capture = GatedCapture {
            id: CaptureId::next(),
            gate: rx,
            dropped: dropped.clone(),
        };
        (Box::new(capture), tx, dropped)
    }

    #[test]
    fn test_read_returns_frame_before_deadline() {
        let (capture, gate, _) = gated();
        let mut timed = TimedCapture::new(capture, Duration::from_secs(1)).unwrap();

        gate.send(5).unwrap();
        let frame = timed.read().into_frame().unwrap();
        assert_eq!(frame.data(), &[5, 5, 5]);
        assert!(!timed.is_pending());
        assert_eq!(timed.device_index(), 7);
    }

    #[test]
    fn test_read_times_out_within_bound() {
        let (capture, _gate, _) = gated();
        let mut timed = TimedCapture::new(capture, Duration::from_millis(30)).unwrap();

        let start = Instant::now();
        assert!(matches!(timed.read(), ReadOutcome::TimedOut));
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(timed.is_pending());
    }

    #[test]
    fn test_outstanding_read_is_collected_next_call() {
        let (capture, gate, _) = gated();
        let mut timed = TimedCapture::new(capture, Duration::from_millis(30)).unwrap();

        assert!(matches!(timed.read(), ReadOutcome::TimedOut));
        assert!(matches!(timed.read(), ReadOutcome::TimedOut));

        // Only one request was issued, so the first frame answers it
        gate.send(1).unwrap();
        gate.send(2).unwrap();
        let first = timed.read().into_frame().unwrap();
        let second = timed.read().into_frame().unwrap();
        assert_eq!(first.data()[0], 1);
        assert_eq!(second.data()[0], 2);
    }

    #[test]
    fn test_drop_releases_idle_device() {
        let (capture, _gate, dropped) = gated();
        let timed = TimedCapture::new(capture, Duration::from_millis(30)).unwrap();

        drop(timed);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_detaches_outstanding_read() {
        let (capture, gate, dropped) = gated();
        let mut timed = TimedCapture::new(capture, Duration::from_millis(20)).unwrap();
        assert!(matches!(timed.read(), ReadOutcome::TimedOut));

        drop(timed);
        assert!(!dropped.load(Ordering::SeqCst));

        // The detached reader closes the device once its read returns
        gate.send(0).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !dropped.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_join_on_drop_waits_for_outstanding_read() {
        let (capture, gate, dropped) = gated();
        let mut timed = TimedCapture::new(capture, Duration::from_millis(20))
            .unwrap()
            .join_on_drop(true);
        assert!(matches!(timed.read(), ReadOutcome::TimedOut));
        assert!(timed.is_pending());

        let release = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            gate.send(3).unwrap();
        });

        let start = Instant::now();
        drop(timed);
        assert!(dropped.load(Ordering::SeqCst));
        assert!(start.elapsed() >= Duration::from_millis(30));
        release.join().unwrap();
    }

    #[test]
    fn test_id_is_forwarded() {
        let (capture, _gate, _) = gated();
        let id = capture.id();
        let timed = TimedCapture::new(capture, Duration::from_millis(30)).unwrap();
        assert_eq!(timed.id(), id);
    }
}
