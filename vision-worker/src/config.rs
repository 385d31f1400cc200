//! Worker configuration

use std::time::Duration;
use vision_frame::{UVec2, DEFAULT_DISPLAY_BOUNDS};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Capture device opened on the first `start()`
    pub device_index: u32,
    /// Box that published frames are fitted into
    pub display_bounds: UVec2,
    /// Deadline for a single device read; `None` reads without a bound
    pub read_timeout: Option<Duration>,
    /// Block shutdown until a timed-out read has returned instead of
    /// detaching the reader thread
    pub join_reader_on_drop: bool,
    /// Consecutive failed reads before a stall is reported
    pub stall_threshold: u32,
    /// Pause between read attempts while stalled
    pub stall_backoff: Duration,
    /// Pin the worker thread to this CPU core
    pub pin_core: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            display_bounds: DEFAULT_DISPLAY_BOUNDS,
            read_timeout: Some(Duration::from_secs(2)),
            join_reader_on_drop: false,
            stall_threshold: 30,
            stall_backoff: Duration::from_millis(10),
            pin_core: None,
        }
    }
}
