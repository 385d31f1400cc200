//! Vision capture sources
//!
//! Pull-based frame sources addressed by device index:
//! - [`FrameSource`] / [`Capture`] traits
//! - [`TimedCapture`] bounding every read with a deadline
//! - [`SyntheticSource`] test pattern, [`ScriptedSource`] replayed outcomes
//! - `V4l2Source` for real cameras (feature `v4l2`, Linux)

pub mod scripted;
pub mod source;
pub mod synthetic;
pub mod timed;
#[cfg(all(feature = "v4l2", target_os = "linux"))]
pub mod v4l2;

pub use scripted::*;
pub use source::*;
pub use synthetic::*;
pub use timed::*;
#[cfg(all(feature = "v4l2", target_os = "linux"))]
pub use v4l2::*;
