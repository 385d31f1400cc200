//! Keep-aspect-ratio fitting and nearest-neighbour resampling
//!
//! Sizes are `glam::UVec2` (x = width, y = height). Fitting uses integer
//! arithmetic so results are reproducible across platforms.

use crate::types::Frame;
use glam::UVec2;
use rayon::prelude::*;

/// Bounding box of the preview surface
pub const DEFAULT_DISPLAY_BOUNDS: UVec2 = UVec2::new(640, 480);

/// Fit `size` inside `bounds` preserving the aspect ratio
///
/// The scale factor is the smaller of `bounds.x / size.x` and
/// `bounds.y / size.y`, applied to both axes. No padding is added, so one axis
/// matches the box exactly and the other is at most the box. Frames smaller
/// than the box are scaled up.
///
/// A zero-sized input or box yields a 1x1 result.
pub fn fit_within(size: UVec2, bounds: UVec2) -> UVec2 {
    if size.x == 0 || size.y == 0 || bounds.x == 0 || bounds.y == 0 {
        return UVec2::ONE;
    }

    let (w, h) = (size.x as u64, size.y as u64);
    let (bw, bh) = (bounds.x as u64, bounds.y as u64);

    // Width the frame would have at full box height
    let rw = bh * w / h;
    let fitted = if rw <= bw {
        UVec2::new(rw as u32, bounds.y)
    } else {
        UVec2::new(bounds.x, (bw * h / w) as u32)
    };

    fitted.max(UVec2::ONE)
}

/// Resample `frame` to `size` with nearest-neighbour lookup
///
/// Rows are filled in parallel; the channel layout is unchanged.
pub fn resize_nearest(frame: &Frame, size: UVec2) -> Frame {
    let size = size.max(UVec2::ONE);
    if size == frame.size() {
        return frame.clone();
    }

    let ch = frame.channels() as usize;
    let (src_w, src_h) = (frame.width() as u64, frame.height() as u64);
    let (dst_w, dst_h) = (size.x as u64, size.y as u64);
    let dst_stride = size.x as usize * ch;

    // Source column for every destination column, computed once
    let x_map: Vec<usize> = (0..dst_w)
        .map(|x| ((x * src_w / dst_w) as usize) * ch)
        .collect();

    let mut data = vec![0u8; dst_stride * size.y as usize];
    data.par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_y = (y as u64 * src_h / dst_h) as u32;
            let src_row = frame.row(src_y);
            for (dst_px, &src_x) in dst_row.chunks_exact_mut(ch).zip(x_map.iter()) {
                dst_px.copy_from_slice(&src_row[src_x..src_x + ch]);
            }
        });

    Frame::from_parts(size.x, size.y, frame.channels(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_upscales_square_into_box() {
        let fitted = fit_within(UVec2::new(4, 4), DEFAULT_DISPLAY_BOUNDS);
        assert_eq!(fitted, UVec2::new(480, 480));
    }

    #[test]
    fn test_fit_wide_frame_is_width_limited() {
        let fitted = fit_within(UVec2::new(1280, 720), DEFAULT_DISPLAY_BOUNDS);
        assert_eq!(fitted, UVec2::new(640, 360));
    }

    #[test]
    fn test_fit_same_aspect_matches_box() {
        let fitted = fit_within(UVec2::new(1920, 1440), DEFAULT_DISPLAY_BOUNDS);
        assert_eq!(fitted, DEFAULT_DISPLAY_BOUNDS);
    }

    #[test]
    fn test_fit_tall_frame_is_height_limited() {
        let fitted = fit_within(UVec2::new(480, 960), DEFAULT_DISPLAY_BOUNDS);
        assert_eq!(fitted, UVec2::new(240, 480));
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        for (w, h) in [(640u32, 480u32), (1920, 1080), (300, 200), (7, 3), (3, 7)] {
            let fitted = fit_within(UVec2::new(w, h), DEFAULT_DISPLAY_BOUNDS);
            assert!(fitted.x <= 640 && fitted.y <= 480);
            assert!(fitted.x == 640 || fitted.y == 480);

            // Truncation loses less than one pixel on the derived axis
            let cross = (fitted.x as i64 * h as i64 - fitted.y as i64 * w as i64).abs();
            assert!(cross < w.max(h) as i64, "{w}x{h} -> {fitted}");
        }
    }

    #[test]
    fn test_fit_degenerate_inputs() {
        assert_eq!(fit_within(UVec2::ZERO, DEFAULT_DISPLAY_BOUNDS), UVec2::ONE);
        assert_eq!(fit_within(UVec2::new(10, 10), UVec2::ZERO), UVec2::ONE);
        assert_eq!(fit_within(UVec2::new(10000, 1), UVec2::new(640, 480)), UVec2::new(640, 1));
    }

    #[test]
    fn test_resize_nearest_upscale() {
        // 2x1 RGB: red, blue
        let frame = Frame::new(2, 1, 3, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let resized = resize_nearest(&frame, UVec2::new(4, 2));

        assert_eq!(resized.size(), UVec2::new(4, 2));
        assert_eq!(resized.pixel(0, 0), &[255, 0, 0]);
        assert_eq!(resized.pixel(1, 1), &[255, 0, 0]);
        assert_eq!(resized.pixel(2, 0), &[0, 0, 255]);
        assert_eq!(resized.pixel(3, 1), &[0, 0, 255]);
    }

    #[test]
    fn test_resize_nearest_downscale_keeps_channels() {
        let frame = Frame::filled(8, 8, 4, 9).unwrap();
        let resized = resize_nearest(&frame, UVec2::new(2, 2));

        assert_eq!(resized.channels(), 4);
        assert_eq!(resized.data(), &[9u8; 16][..]);
    }

    #[test]
    fn test_resize_same_size_is_copy() {
        let frame = Frame::filled(3, 3, 1, 7).unwrap();
        assert_eq!(resize_nearest(&frame, UVec2::new(3, 3)), frame);
    }
}
