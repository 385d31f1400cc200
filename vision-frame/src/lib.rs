//! Vision frame primitives
//!
//! Raster frames as produced by capture devices and consumed by the preview,
//! plus the conversions that turn a processed frame into a display image.
//!
//! - Tightly packed 8-bit frames with validated shape
//! - Integer keep-aspect-ratio fitting (no padding)
//! - Parallel nearest-neighbour resize
//! - Channel conversion to RGB888 and YUYV decoding

pub mod format_conversion;
pub mod scaling;
pub mod types;

pub use format_conversion::*;
pub use scaling::*;
pub use types::*;

pub use glam::UVec2;
