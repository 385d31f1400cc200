//! Scripted source for deterministic pipelines
//!
//! Reads replay a queue of outcomes that can be extended while a worker is
//! running. A [`ScriptHandle`] stays with the caller after the source has been
//! handed off, so tests and tools can feed frames and observe how the device
//! was used (opens, reads, handle identity).

use crate::source::{Capture, CaptureError, CaptureId, FrameSource, ReadOutcome};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use vision_frame::Frame;

/// What a read does when the script is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenEmpty {
    /// Report a transient failure immediately
    Transient,
    /// Block until a step is pushed or the script is closed, like a camera
    /// waiting on hardware
    Block,
}

/// One scripted read result
#[derive(Debug)]
pub enum ScriptStep {
    Frame(Frame),
    Transient,
}

#[derive(Default)]
struct ScriptState {
    steps: VecDeque<ScriptStep>,
    closed: bool,
    available: bool,
    opens: usize,
    reads: usize,
    last_capture: Option<CaptureId>,
}

struct Shared {
    state: Mutex<ScriptState>,
    pushed: Condvar,
}

pub struct ScriptedSource {
    shared: Arc<Shared>,
    when_empty: WhenEmpty,
    device_count: u32,
}

impl ScriptedSource {
    /// Create a source with one device (index 0) and its control handle
    pub fn new(when_empty: WhenEmpty) -> (Self, ScriptHandle) {
        let shared = Arc::new(Shared {
            state: Mutex::new(ScriptState {
                available: true,
                ..ScriptState::default()
            }),
            pushed: Condvar::new(),
        });

        let source = Self {
            shared: shared.clone(),
            when_empty,
            device_count: 1,
        };
        (source, ScriptHandle { shared })
    }

    pub fn with_device_count(mut self, device_count: u32) -> Self {
        self.device_count = device_count;
        self
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn Capture>, CaptureError> {
        let mut state = self.shared.state.lock();
        if device_index >= self.device_count {
            return Err(CaptureError::unavailable(device_index, "no such scripted device"));
        }
        if !state.available {
            return Err(CaptureError::unavailable(device_index, "device busy"));
        }

        let id = CaptureId::next();
        state.opens += 1;
        state.last_capture = Some(id);

        Ok(Box::new(ScriptedCapture {
            id,
            device_index,
            shared: self.shared.clone(),
            when_empty: self.when_empty,
        }))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

struct ScriptedCapture {
    id: CaptureId,
    device_index: u32,
    shared: Arc<Shared>,
    when_empty: WhenEmpty,
}

impl Capture for ScriptedCapture {
    fn read(&mut self) -> ReadOutcome {
        let mut state = self.shared.state.lock();
        state.reads += 1;

        loop {
            match state.steps.pop_front() {
                Some(ScriptStep::Frame(frame)) => return ReadOutcome::Frame(frame),
                Some(ScriptStep::Transient) => return ReadOutcome::Transient,
                None if state.closed || self.when_empty == WhenEmpty::Transient => {
                    return ReadOutcome::Transient
                }
                None => self.shared.pushed.wait(&mut state),
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

/// Caller-side control over a [`ScriptedSource`]
#[derive(Clone)]
pub struct ScriptHandle {
    shared: Arc<Shared>,
}

impl ScriptHandle {
    pub fn push(&self, step: ScriptStep) {
        self.shared.state.lock().steps.push_back(step);
        self.shared.pushed.notify_all();
    }

    pub fn push_frame(&self, frame: Frame) {
        self.push(ScriptStep::Frame(frame));
    }

    pub fn push_transient(&self, count: usize) {
        let mut state = self.shared.state.lock();
        state
            .steps
            .extend(std::iter::repeat_with(|| ScriptStep::Transient).take(count));
        drop(state);
        self.shared.pushed.notify_all();
    }

    /// Wake blocked reads; exhausted reads fail transiently from now on
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.pushed.notify_all();
    }

    /// Make later `open` calls succeed or fail
    pub fn set_available(&self, available: bool) {
        self.shared.state.lock().available = available;
    }

    /// Steps not consumed yet
    pub fn remaining(&self) -> usize {
        self.shared.state.lock().steps.len()
    }

    pub fn opens(&self) -> usize {
        self.shared.state.lock().opens
    }

    pub fn reads(&self) -> usize {
        self.shared.state.lock().reads
    }

    pub fn last_capture_id(&self) -> Option<CaptureId> {
        self.shared.state.lock().last_capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_replays_steps_in_order() {
        let (mut source, script) = ScriptedSource::new(WhenEmpty::Transient);
        script.push_frame(Frame::filled(1, 1, 3, 1).unwrap());
        script.push_transient(1);
        script.push_frame(Frame::filled(1, 1, 3, 2).unwrap());

        let mut capture = source.open(0).unwrap();
        assert_eq!(capture.read().into_frame().unwrap().data()[0], 1);
        assert!(matches!(capture.read(), ReadOutcome::Transient));
        assert_eq!(capture.read().into_frame().unwrap().data()[0], 2);
        assert!(matches!(capture.read(), ReadOutcome::Transient));
        assert_eq!(script.reads(), 4);
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn test_open_tracking_and_availability() {
        let (mut source, script) = ScriptedSource::new(WhenEmpty::Transient);

        assert!(matches!(
            source.open(1),
            Err(CaptureError::DeviceUnavailable { index: 1, .. })
        ));

        script.set_available(false);
        assert!(source.open(0).is_err());
        assert_eq!(script.opens(), 0);

        script.set_available(true);
        let capture = source.open(0).unwrap();
        assert_eq!(script.opens(), 1);
        assert_eq!(script.last_capture_id(), Some(capture.id()));
    }

    #[test]
    fn test_blocking_read_wakes_on_push() {
        let (mut source, script) = ScriptedSource::new(WhenEmpty::Block);
        let mut capture = source.open(0).unwrap();

        let feeder = script.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            feeder.push_frame(Frame::filled(2, 2, 3, 9).unwrap());
        });

        let frame = capture.read().into_frame().unwrap();
        assert_eq!(frame.data()[0], 9);
        handle.join().unwrap();
    }

    #[test]
    fn test_close_releases_blocked_read() {
        let (mut source, script) = ScriptedSource::new(WhenEmpty::Block);
        let mut capture = source.open(0).unwrap();

        let closer = script.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        assert!(matches!(capture.read(), ReadOutcome::Transient));
        handle.join().unwrap();
    }
}
