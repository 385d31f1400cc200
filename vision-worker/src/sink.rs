//! Display sink contract and the single-slot latest-wins handoff
//!
//! The worker publishes from its own thread. [`LatestFrameSlot`] keeps only
//! the newest frame: publishing over a frame the consumer never drained
//! replaces it and counts it as overwritten.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vision_frame::Frame;

/// Consumer of display-ready frames
///
/// Called from the worker thread, never from the consumer's own context.
/// Implementations must hand the frame off without blocking for long.
pub trait DisplaySink: Send + Sync {
    fn publish(&self, frame: Frame);
}

/// A published frame tagged with its position in the stream
#[derive(Debug)]
pub struct DisplayFrame {
    /// Starts at 1 and increases by one per publish
    pub sequence: u64,
    pub published_at: Instant,
    pub frame: Frame,
}

#[derive(Default)]
struct SlotState {
    latest: Option<Arc<DisplayFrame>>,
    undrained: bool,
}

/// Capacity-one buffer between the worker and a display
#[derive(Default)]
pub struct LatestFrameSlot {
    state: Mutex<SlotState>,
    fresh: Condvar,

    // Statistics (atomic for lock-free reads)
    sequence: AtomicU64,
    overwritten: AtomicU64,
    drained: AtomicU64,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published frame, drained or not
    pub fn latest(&self) -> Option<Arc<DisplayFrame>> {
        self.state.lock().latest.clone()
    }

    /// Consume the newest frame if it has not been consumed yet
    pub fn take(&self) -> Option<Arc<DisplayFrame>> {
        let mut state = self.state.lock();
        self.drain(&mut state)
    }

    /// Block until a frame newer than `after` is published, or `timeout` passes
    ///
    /// Pass the sequence of the last frame shown (0 for none). The returned
    /// frame is marked drained.
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> Option<Arc<DisplayFrame>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            let newer = state
                .latest
                .as_ref()
                .map(|f| f.sequence > after)
                .unwrap_or(false);
            if newer {
                if state.undrained {
                    state.undrained = false;
                    self.drained.fetch_add(1, Ordering::Relaxed);
                }
                return state.latest.clone();
            }
            if self.fresh.wait_until(&mut state, deadline).timed_out() {
                return None;
            }
        }
    }

    fn drain(&self, state: &mut SlotState) -> Option<Arc<DisplayFrame>> {
        if !state.undrained {
            return None;
        }
        state.undrained = false;
        self.drained.fetch_add(1, Ordering::Relaxed);
        state.latest.clone()
    }

    /// Sequence number of the newest frame (0 before the first publish)
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SlotStats {
        SlotStats {
            published: self.sequence.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

impl DisplaySink for LatestFrameSlot {
    fn publish(&self, frame: Frame) {
        let mut state = self.state.lock();
        let sequence = self.sequence.load(Ordering::Relaxed) + 1;

        if state.undrained {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        state.latest = Some(Arc::new(DisplayFrame {
            sequence,
            published_at: Instant::now(),
            frame,
        }));
        state.undrained = true;
        self.sequence.store(sequence, Ordering::Release);
        drop(state);

        self.fresh.notify_all();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStats {
    pub published: u64,
    /// Frames replaced before any consumer drained them
    pub overwritten: u64,
    pub drained: u64,
}
