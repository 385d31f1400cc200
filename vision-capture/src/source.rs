//! Frame source abstraction
//!
//! A [`FrameSource`] opens index-addressed devices; the returned [`Capture`]
//! handle is pulled for frames. Dropping the handle closes the device.

use std::sync::atomic::{AtomicU64, Ordering};
use vision_frame::Frame;

static NEXT_CAPTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an opened capture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureId(u64);

impl CaptureId {
    pub fn next() -> Self {
        CaptureId(NEXT_CAPTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Result of a single read attempt
#[derive(Debug)]
pub enum ReadOutcome {
    /// The device produced a frame
    Frame(Frame),
    /// The read failed; the next attempt may succeed
    Transient,
    /// No result within the read deadline (see [`crate::TimedCapture`])
    TimedOut,
}

impl ReadOutcome {
    pub fn is_frame(&self) -> bool {
        matches!(self, ReadOutcome::Frame(_))
    }

    pub fn into_frame(self) -> Option<Frame> {
        match self {
            ReadOutcome::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// An open capture device
///
/// `read` may block until the hardware delivers data; there is no built-in
/// deadline. Wrap the handle in [`crate::TimedCapture`] to bound it.
pub trait Capture: Send {
    fn read(&mut self) -> ReadOutcome;

    fn id(&self) -> CaptureId;

    fn device_index(&self) -> u32;
}

/// Opens capture devices by index
pub trait FrameSource: Send {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn Capture>, CaptureError>;

    /// Short human-readable description used in logs
    fn describe(&self) -> String {
        "frame source".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },
    #[error("failed to spawn capture reader thread: {0}")]
    ReaderSpawn(#[source] std::io::Error),
}

impl CaptureError {
    pub fn unavailable(index: u32, reason: impl ToString) -> Self {
        CaptureError::DeviceUnavailable {
            index,
            reason: reason.to_string(),
        }
    }
}
