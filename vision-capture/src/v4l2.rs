//! V4L2 camera devices (`/dev/video{index}`)
//!
//! Requests packed YUYV at the configured size and decodes every buffer to
//! RGB888. Devices that refuse YUYV are reported as unavailable.

use crate::source::{Capture, CaptureError, CaptureId, FrameSource, ReadOutcome};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture as _;
use v4l::{Device, FourCC};
use vision_frame::yuyv_to_rgb888;

#[derive(Debug, Clone)]
pub struct V4l2Config {
    pub width: u32,
    pub height: u32,
    /// Number of memory-mapped driver buffers
    pub buffers: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            buffers: 4,
        }
    }
}

pub struct V4l2Source {
    config: V4l2Config,
}

impl V4l2Source {
    pub fn new(config: V4l2Config) -> Self {
        Self { config }
    }
}

impl FrameSource for V4l2Source {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn Capture>, CaptureError> {
        let unavailable = |e: std::io::Error| CaptureError::unavailable(device_index, e);

        let device = Device::new(device_index as usize).map_err(unavailable)?;
        let yuyv = FourCC::new(b"YUYV");

        let mut format = device.format().map_err(unavailable)?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = yuyv;
        let format = device.set_format(&format).map_err(unavailable)?;
        if format.fourcc != yuyv {
            return Err(CaptureError::unavailable(
                device_index,
                format!("device offers {} instead of YUYV", format.fourcc),
            ));
        }

        let stream = Stream::with_buffers(&device, Type::VideoCapture, self.config.buffers)
            .map_err(unavailable)?;

        log::info!(
            "Opened /dev/video{} at {}x{} YUYV",
            device_index,
            format.width,
            format.height
        );

        Ok(Box::new(V4l2Capture {
            id: CaptureId::next(),
            device_index,
            width: format.width,
            height: format.height,
            stream,
            _device: device,
        }))
    }

    fn describe(&self) -> String {
        format!("v4l2 {}x{}", self.config.width, self.config.height)
    }
}

struct V4l2Capture {
    id: CaptureId,
    device_index: u32,
    width: u32,
    height: u32,
    // Declared before the device so buffers are unmapped first
    stream: Stream<'static>,
    _device: Device,
}

impl Capture for V4l2Capture {
    fn read(&mut self) -> ReadOutcome {
        match self.stream.next() {
            Ok((buf, _meta)) => match yuyv_to_rgb888(buf, self.width, self.height) {
                Ok(frame) => ReadOutcome::Frame(frame),
                Err(e) => {
                    log::warn!("Dropping malformed buffer from /dev/video{}: {}", self.device_index, e);
                    ReadOutcome::Transient
                }
            },
            Err(e) => {
                log::debug!("Read from /dev/video{} failed: {}", self.device_index, e);
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
