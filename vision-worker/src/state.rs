//! Worker lifecycle states, events and statistics

use std::sync::atomic::{AtomicU64, Ordering};
use vision_capture::CaptureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    Running,
    /// Terminal; a stopped worker cannot be started again
    Stopped,
}

/// Notifications from the worker, delivered over a crossbeam channel
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Started { capture: CaptureId },
    /// Consecutive failed reads reached the stall threshold
    CaptureStalled { consecutive_failures: u32 },
    /// A frame arrived after a stall
    CaptureRecovered { after_failures: u32 },
    /// Sent exactly once per worker
    Finished(WorkerReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The loop ran and was stopped
    Stopped,
    /// `stop()` was called before the loop ever ran
    NeverStarted,
    /// The loop thread unwound outside an operation
    Panicked,
}

/// Final status delivered on completion
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub exit: WorkerExit,
    pub capture: Option<CaptureId>,
    pub stats: WorkerStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub frames_read: u64,
    pub frames_published: u64,
    pub transient_failures: u64,
    /// Frames an operation produced that could not be displayed
    pub dropped_frames: u64,
    pub stall_episodes: u64,
}

#[derive(Default)]
pub(crate) struct WorkerCounters {
    frames_read: AtomicU64,
    frames_published: AtomicU64,
    transient_failures: AtomicU64,
    dropped_frames: AtomicU64,
    stall_episodes: AtomicU64,
}

impl WorkerCounters {
    pub(crate) fn frame_read(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transient_failure(&self) {
        self.transient_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_dropped(&self) {
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stall(&self) {
        self.stall_episodes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            dropped_frames: self.dropped_frames.load(Ordering::Relaxed),
            stall_episodes: self.stall_episodes.load(Ordering::Relaxed),
        }
    }
}
