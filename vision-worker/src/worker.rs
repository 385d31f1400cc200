//! Preview worker loop
//!
//! One dedicated thread pulls frames from the capture handle, runs the active
//! operation, fits the result into the display box and publishes it. Commands
//! take `&self` and never block on camera I/O: switching operations swaps an
//! `Arc` under a `RwLock`, stopping flips an atomic flag that the loop checks
//! between iterations.

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::sink::DisplaySink;
use crate::state::{WorkerCounters, WorkerEvent, WorkerExit, WorkerReport, WorkerState, WorkerStats};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use vision_capture::{Capture, CaptureId, FrameSource, ReadOutcome, TimedCapture};
use vision_frame::prepare_for_display;
use vision_ops::{Operation, OperationRegistry};

pub struct Worker {
    config: WorkerConfig,
    registry: Arc<OperationRegistry>,
    sink: Arc<dyn DisplaySink>,
    lifecycle: Mutex<Lifecycle>,
    shared: Arc<Shared>,
    events: Receiver<WorkerEvent>,
}

struct Lifecycle {
    state: WorkerState,
    source: Box<dyn FrameSource>,
    capture: Option<CaptureId>,
    thread: Option<JoinHandle<()>>,
}

/// State reachable from both the control side and the loop thread
struct Shared {
    stop: AtomicBool,
    active: RwLock<Arc<Operation>>,
    counters: WorkerCounters,
    events: Sender<WorkerEvent>,
    finished: AtomicBool,
    report: Mutex<Option<WorkerReport>>,
    reported: Condvar,
}

impl Shared {
    fn emit(&self, event: WorkerEvent) {
        // The receiver lives as long as the worker
        let _ = self.events.send(event);
    }

    /// Record the final report; only the first call has any effect
    fn finish(&self, exit: WorkerExit, capture: Option<CaptureId>) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }

        let report = WorkerReport {
            exit,
            capture,
            stats: self.counters.snapshot(),
        };
        log::info!(
            "Worker finished ({:?}): {} frames read, {} published",
            exit,
            report.stats.frames_read,
            report.stats.frames_published
        );
        *self.report.lock() = Some(report.clone());
        self.reported.notify_all();
        self.emit(WorkerEvent::Finished(report));
    }
}

impl Worker {
    /// Create a worker that has not opened its device yet
    ///
    /// The identity operation is active until another one is selected.
    pub fn new(
        source: Box<dyn FrameSource>,
        sink: Arc<dyn DisplaySink>,
        registry: Arc<OperationRegistry>,
        config: WorkerConfig,
    ) -> Self {
        let (tx, rx) = channel::unbounded();
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            active: RwLock::new(registry.identity()),
            counters: WorkerCounters::default(),
            events: tx,
            finished: AtomicBool::new(false),
            report: Mutex::new(None),
            reported: Condvar::new(),
        });

        Worker {
            config,
            registry,
            sink,
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::NotStarted,
                source,
                capture: None,
                thread: None,
            }),
            shared,
            events: rx,
        }
    }

    /// Open the device and start the loop
    ///
    /// A failed open leaves the worker `NotStarted` so the call can be
    /// retried. Starting a running worker does nothing.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            WorkerState::Running => return Ok(()),
            WorkerState::Stopped => return Err(WorkerError::Stopped),
            WorkerState::NotStarted => {}
        }

        let capture = match lifecycle.source.open(self.config.device_index) {
            Ok(capture) => capture,
            Err(e) => {
                log::warn!("Failed to open {}: {}", lifecycle.source.describe(), e);
                return Err(e.into());
            }
        };
        let id = capture.id();
        let capture: Box<dyn Capture> = match self.config.read_timeout {
            Some(timeout) => Box::new(
                TimedCapture::new(capture, timeout)?
                    .join_on_drop(self.config.join_reader_on_drop),
            ),
            None => capture,
        };

        let handle = self.spawn_loop(capture, id)?;
        lifecycle.thread = Some(handle);
        lifecycle.capture = Some(id);
        lifecycle.state = WorkerState::Running;

        log::info!(
            "Worker started on device {} ({})",
            self.config.device_index,
            lifecycle.source.describe()
        );
        self.shared.emit(WorkerEvent::Started { capture: id });
        Ok(())
    }

    /// Switch to the identity operation; the loop keeps running
    pub fn pause(&self) {
        *self.shared.active.write() = self.registry.identity();
        log::debug!("Worker paused");
    }

    /// Make `name` the active operation
    ///
    /// An unknown name leaves the current operation in place. A selection
    /// made before `start()` applies to the first frame.
    pub fn select_operation(&self, name: &str) -> Result<()> {
        let operation = self.registry.lookup(name)?;
        log::debug!("Active operation: {}", operation.name());
        *self.shared.active.write() = operation;
        Ok(())
    }

    /// Ask the loop to exit after its current iteration
    ///
    /// The state becomes `Stopped` at once. Completion is reported on the
    /// event channel when the loop has wound down, or right away for a worker
    /// that never started.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            WorkerState::Stopped => return,
            WorkerState::NotStarted => {
                lifecycle.state = WorkerState::Stopped;
                self.shared.finish(WorkerExit::NeverStarted, None);
            }
            WorkerState::Running => {
                lifecycle.state = WorkerState::Stopped;
                self.shared.stop.store(true, Ordering::Release);
            }
        }
        log::info!("Worker stop requested");
    }

    /// Block until the worker has finished and return the final report
    ///
    /// Any number of threads may wait; all of them return once a running
    /// worker has been stopped by another caller. Returns `None` for a worker
    /// that was neither started nor stopped.
    pub fn wait(&self) -> Option<WorkerReport> {
        let (handle, state, capture) = {
            let mut lifecycle = self.lifecycle.lock();
            (lifecycle.thread.take(), lifecycle.state, lifecycle.capture)
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
                self.shared.finish(WorkerExit::Panicked, capture);
            }
        } else if state == WorkerState::NotStarted {
            return self.shared.report.lock().clone();
        }

        let mut report = self.shared.report.lock();
        while report.is_none() {
            self.shared.reported.wait(&mut report);
        }
        report.clone()
    }

    /// Final report, or `None` while the worker has not finished
    pub fn report(&self) -> Option<WorkerReport> {
        self.shared.report.lock().clone()
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.lock().state
    }

    pub fn stats(&self) -> WorkerStats {
        self.shared.counters.snapshot()
    }

    /// Lifecycle and stall notifications
    pub fn events(&self) -> Receiver<WorkerEvent> {
        self.events.clone()
    }

    /// Identity of the open capture handle
    pub fn capture_id(&self) -> Option<CaptureId> {
        self.lifecycle.lock().capture
    }

    pub fn active_operation(&self) -> Arc<Operation> {
        self.shared.active.read().clone()
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    fn spawn_loop(&self, capture: Box<dyn Capture>, id: CaptureId) -> Result<JoinHandle<()>> {
        let shared = self.shared.clone();
        let sink = self.sink.clone();
        let config = self.config.clone();

        thread::Builder::new()
            .name("vision-worker".to_string())
            .spawn(move || {
                if let Some(core) = config.pin_core {
                    pin_to_core(core);
                }

                let exit = match panic::catch_unwind(AssertUnwindSafe(|| {
                    run_loop(&shared, capture, sink.as_ref(), &config)
                })) {
                    Ok(()) => WorkerExit::Stopped,
                    Err(_) => {
                        log::error!("Worker loop panicked");
                        WorkerExit::Panicked
                    }
                };
                shared.finish(exit, Some(id));
            })
            .map_err(WorkerError::Spawn)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.lifecycle.get_mut().thread.take() {
            handle.join().ok();
        }
    }
}

fn pin_to_core(index: usize) {
    let core = core_affinity::get_core_ids()
        .and_then(|ids| ids.into_iter().find(|core| core.id == index));

    match core {
        Some(core) if core_affinity::set_for_current(core) => {
            log::debug!("Worker pinned to core {}", index);
        }
        _ => log::warn!("Could not pin worker to core {}", index),
    }
}

fn run_loop(
    shared: &Shared,
    mut capture: Box<dyn Capture>,
    sink: &dyn DisplaySink,
    config: &WorkerConfig,
) {
    let threshold = config.stall_threshold.max(1);
    let mut failures: u32 = 0;
    let mut stalled = false;

    while !shared.stop.load(Ordering::Acquire) {
        let frame = match capture.read() {
            ReadOutcome::Frame(frame) => frame,
            ReadOutcome::Transient | ReadOutcome::TimedOut => {
                shared.counters.transient_failure();
                failures = failures.saturating_add(1);

                if failures >= threshold {
                    if !stalled {
                        stalled = true;
                        shared.counters.stall();
                        log::warn!(
                            "Capture stalled on device {} after {} failed reads",
                            capture.device_index(),
                            failures
                        );
                        shared.emit(WorkerEvent::CaptureStalled {
                            consecutive_failures: failures,
                        });
                    }
                    thread::sleep(config.stall_backoff);
                }
                continue;
            }
        };

        shared.counters.frame_read();
        if stalled {
            stalled = false;
            log::info!("Capture recovered after {} failed reads", failures);
            shared.emit(WorkerEvent::CaptureRecovered {
                after_failures: failures,
            });
        }
        failures = 0;

        let operation = shared.active.read().clone();
        let processed = match panic::catch_unwind(AssertUnwindSafe(|| operation.apply(frame))) {
            Ok(processed) => processed,
            Err(_) => {
                log::warn!("Operation '{}' panicked, frame dropped", operation.name());
                shared.counters.frame_dropped();
                continue;
            }
        };

        match prepare_for_display(processed, config.display_bounds) {
            Ok(display) => {
                sink.publish(display);
                shared.counters.frame_published();
            }
            Err(e) => {
                log::warn!("Operation '{}' output dropped: {}", operation.name(), e);
                shared.counters.frame_dropped();
            }
        }
    }

    log::debug!("Worker loop exiting");
}
