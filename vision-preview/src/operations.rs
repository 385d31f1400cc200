//! Demo operations shipped with the headless preview

use rayon::prelude::*;
use vision_frame::Frame;
use vision_ops::{OperationRegistry, RegistryError};

/// Registry with "No Detection" plus the demo transforms
pub fn registry() -> Result<OperationRegistry, RegistryError> {
    Ok(OperationRegistry::builder()
        .register_snake_case("invert", invert)?
        .register_snake_case("grayscale", grayscale)?
        .register_snake_case("mirror", mirror)?
        .build())
}

fn invert(mut frame: Frame) -> Frame {
    frame.data_mut().par_iter_mut().for_each(|v| *v = 255 - *v);
    frame
}

/// Rec.601 luma; outputs a single-channel frame
fn grayscale(frame: Frame) -> Frame {
    let channels = frame.channels() as usize;
    if channels < 3 {
        return frame;
    }

    let luma: Vec<u8> = frame
        .data()
        .par_chunks_exact(channels)
        .map(|px| ((px[0] as u32 * 77 + px[1] as u32 * 150 + px[2] as u32 * 29) >> 8) as u8)
        .collect();

    match Frame::new(frame.width(), frame.height(), 1, luma) {
        Ok(gray) => gray,
        Err(_) => frame,
    }
}

/// Horizontal flip
fn mirror(mut frame: Frame) -> Frame {
    let channels = frame.channels() as usize;
    let stride = frame.stride();

    frame.data_mut().par_chunks_mut(stride).for_each(|row| {
        let pixels = row.len() / channels;
        for x in 0..pixels / 2 {
            let (a, b) = (x * channels, (pixels - 1 - x) * channels);
            for c in 0..channels {
                row.swap(a + c, b + c);
            }
        }
    });
    frame
}
