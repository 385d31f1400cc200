//! Live preview worker
//!
//! Runs a frame source through a swappable operation on a background thread
//! and hands display-ready RGB888 frames to a sink.
//!
//! - [`Worker`]: lifecycle, operation switching, completion report
//! - [`LatestFrameSlot`]: latest-wins display handoff
//! - [`PreviewController`]: start/pause toggle for interactive front ends

pub mod config;
pub mod controller;
pub mod error;
pub mod sink;
pub mod state;
pub mod worker;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use sink::*;
pub use state::*;
pub use worker::*;
