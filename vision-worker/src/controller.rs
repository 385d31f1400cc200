//! Start/pause toggle and operation chooser on top of a [`Worker`]
//!
//! Tracks the run state explicitly and remembers the chosen operation while
//! the preview is paused, so resuming restores it.

use crate::error::Result;
use crate::state::WorkerReport;
use crate::worker::Worker;
use vision_ops::IDENTITY_OPERATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// The worker has never been started
    Idle,
    Previewing,
    Paused,
}

pub struct PreviewController {
    worker: Worker,
    state: PreviewState,
    selected: String,
}

impl PreviewController {
    pub fn new(worker: Worker) -> Self {
        Self {
            worker,
            state: PreviewState::Idle,
            selected: IDENTITY_OPERATION.to_string(),
        }
    }

    /// Record the user's choice, applying it at once when previewing
    pub fn choose(&mut self, name: &str) -> Result<()> {
        if self.state == PreviewState::Previewing {
            self.worker.select_operation(name)?;
        } else {
            self.worker.registry().lookup(name)?;
        }
        self.selected = name.to_string();
        Ok(())
    }

    /// Start or resume the preview, or pause it when it is running
    pub fn toggle(&mut self) -> Result<PreviewState> {
        match self.state {
            PreviewState::Idle | PreviewState::Paused => {
                self.worker.start()?;
                self.worker.select_operation(&self.selected)?;
                self.state = PreviewState::Previewing;
            }
            PreviewState::Previewing => {
                self.worker.pause();
                self.state = PreviewState::Paused;
            }
        }
        Ok(self.state)
    }

    /// Stop the worker and wait for its final report
    pub fn shutdown(self) -> Option<WorkerReport> {
        self.worker.stop();
        self.worker.wait()
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }
}
