//! Conversion of processed frames into the display format (packed RGB888)

use crate::scaling::{fit_within, resize_nearest};
use crate::types::{Frame, FrameError, DISPLAY_CHANNELS};
use glam::UVec2;

/// Convert any supported channel layout to 3-channel RGB888
///
/// - 3 channels pass through untouched
/// - 1 channel (grayscale) is replicated into all three
/// - 4 channels drop the fourth (alpha or padding) byte
pub fn to_rgb888(frame: Frame) -> Result<Frame, FrameError> {
    let (width, height) = (frame.width(), frame.height());

    let data = match frame.channels() {
        3 => return Ok(frame),
        1 => frame.data().iter().flat_map(|&v| [v, v, v]).collect(),
        4 => {
            let pixels: &[[u8; 4]] = bytemuck::cast_slice(frame.data());
            let mut out = Vec::with_capacity(pixels.len() * 3);
            for px in pixels {
                out.extend_from_slice(&px[..3]);
            }
            out
        }
        other => return Err(FrameError::UnsupportedChannels(other)),
    };

    Ok(Frame::from_parts(width, height, DISPLAY_CHANNELS, data))
}

/// Turn a processed frame into a display-ready image inside `bounds`
///
/// The result is RGB888, scaled with [`fit_within`] so that it fits the box
/// without distortion.
pub fn prepare_for_display(frame: Frame, bounds: UVec2) -> Result<Frame, FrameError> {
    let rgb = to_rgb888(frame)?;
    let target = fit_within(rgb.size(), bounds);
    if target == rgb.size() {
        Ok(rgb)
    } else {
        Ok(resize_nearest(&rgb, target))
    }
}

/// Decode packed YUYV (YUV 4:2:2) into RGB888, BT.601 limited range
///
/// Every 4 input bytes `Y0 U Y1 V` yield two RGB pixels. Width must be even.
pub fn yuyv_to_rgb888(input: &[u8], width: u32, height: u32) -> Result<Frame, FrameError> {
    if width % 2 != 0 {
        return Err(FrameError::InvalidDimensions {
            width,
            height,
            channels: 2,
        });
    }
    let expected = Frame::byte_len(width, height, 2)?;
    if input.len() < expected {
        return Err(FrameError::LengthMismatch {
            expected,
            got: input.len(),
        });
    }

    let macropixels: &[[u8; 4]] = bytemuck::cast_slice(&input[..expected]);
    let mut out = Vec::with_capacity(width as usize * height as usize * 3);

    for &[y0, u, y1, v] in macropixels {
        let d = u as i32 - 128;
        let e = v as i32 - 128;
        for y in [y0, y1] {
            let c = 298 * (y as i32 - 16);
            out.push(clamp_u8((c + 409 * e + 128) >> 8));
            out.push(clamp_u8((c - 100 * d - 208 * e + 128) >> 8));
            out.push(clamp_u8((c + 516 * d + 128) >> 8));
        }
    }

    Ok(Frame::from_parts(width, height, DISPLAY_CHANNELS, out))
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}
