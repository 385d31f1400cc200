//! Raster frame type shared by capture, operations and display

use glam::UVec2;
use std::fmt;

/// Largest channel count a frame can carry (RGBA / BGRX)
pub const MAX_CHANNELS: u8 = 4;

/// Channel count of display-ready frames (packed RGB888)
pub const DISPLAY_CHANNELS: u8 = 3;

/// A tightly packed, row-major 8-bit raster buffer
///
/// Raw frames from a capture device and frames produced by an operation share
/// this type. The stride is always `width * channels`.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an existing pixel buffer, validating its shape
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = Self::byte_len(width, height, channels)?;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Assemble a frame whose shape the caller has already validated
    pub(crate) fn from_parts(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * channels as usize
        );
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Allocate a frame with every byte set to `value`
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self, FrameError> {
        let len = Self::byte_len(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![value; len],
        })
    }

    /// Number of bytes a frame of this shape occupies
    pub fn byte_len(width: u32, height: u32, channels: u8) -> Result<usize, FrameError> {
        if width == 0 || height == 0 || channels == 0 || channels > MAX_CHANNELS {
            return Err(FrameError::InvalidDimensions {
                width,
                height,
                channels,
            });
        }
        Ok(width as usize * height as usize * channels as usize)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel access for in-place operations
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// One row of pixels
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Pixel at (x, y) as a channel slice
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let ch = self.channels as usize;
        let start = y as usize * self.stride() + x as usize * ch;
        &self.data[start..start + ch]
    }
}

// Pixel payloads are large; keep Debug output to the shape
impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame shape {width}x{height}x{channels}")]
    InvalidDimensions { width: u32, height: u32, channels: u8 },
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("cannot convert {0}-channel frame to RGB888")]
    UnsupportedChannels(u8),
}
