//! Frame source backed by C callbacks

use crate::{VisionFrameView, VisionOpenFn, VisionReadFn};
use libc::{c_int, c_void};
use vision_capture::{Capture, CaptureError, CaptureId, FrameSource, ReadOutcome};
use vision_frame::Frame;

pub(crate) const READ_FRAME: c_int = 1;

/// Caller-owned context pointer handed back to every callback
#[derive(Clone, Copy)]
pub(crate) struct UserData(pub(crate) *mut c_void);

// The caller guarantees the context may be used from the worker threads
unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

impl UserData {
    pub(crate) fn get(self) -> *mut c_void {
        self.0
    }
}

pub(crate) struct CallbackSource {
    open: VisionOpenFn,
    read: unsafe extern "C" fn(*mut c_void, *mut VisionFrameView) -> c_int,
    user_data: UserData,
}

impl CallbackSource {
    /// `None` when no read callback was supplied
    pub(crate) fn new(open: VisionOpenFn, read: VisionReadFn, user_data: UserData) -> Option<Self> {
        Some(Self {
            open,
            read: read?,
            user_data,
        })
    }
}

impl FrameSource for CallbackSource {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn Capture>, CaptureError> {
        if let Some(open) = self.open {
            let status = unsafe { open(self.user_data.get(), device_index) };
            if status != 0 {
                return Err(CaptureError::unavailable(
                    device_index,
                    format!("open callback returned {}", status),
                ));
            }
        }

        Ok(Box::new(CallbackCapture {
            id: CaptureId::next(),
            device_index,
            read: self.read,
            user_data: self.user_data,
        }))
    }

    fn describe(&self) -> String {
        "C callback source".to_string()
    }
}

struct CallbackCapture {
    id: CaptureId,
    device_index: u32,
    read: unsafe extern "C" fn(*mut c_void, *mut VisionFrameView) -> c_int,
    user_data: UserData,
}

impl Capture for CallbackCapture {
    fn read(&mut self) -> ReadOutcome {
        let mut view = VisionFrameView::empty();
        let status = unsafe { (self.read)(self.user_data.get(), &mut view) };
        if status != READ_FRAME {
            return ReadOutcome::Transient;
        }

        match unsafe { view.to_frame() } {
            Some(frame) => ReadOutcome::Frame(frame),
            None => {
                log::warn!(
                    "Read callback for device {} returned an invalid frame ({}x{}x{})",
                    self.device_index,
                    view.width,
                    view.height,
                    view.channels
                );
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

impl VisionFrameView {
    pub(crate) fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            width: 0,
            height: 0,
            channels: 0,
        }
    }

    /// Copy the described pixels into an owned frame
    ///
    /// # Safety
    /// `data` must be null or point to at least `width * height * channels`
    /// readable bytes.
    pub(crate) unsafe fn to_frame(&self) -> Option<Frame> {
        if self.data.is_null() {
            return None;
        }
        let channels = u8::try_from(self.channels).ok()?;
        let len = Frame::byte_len(self.width, self.height, channels).ok()?;
        let bytes = std::slice::from_raw_parts(self.data, len).to_vec();
        Frame::new(self.width, self.height, channels, bytes).ok()
    }
}
