//! Vision FFI - C Foreign Function Interface
//!
//! C-compatible control surface for the preview worker. The host supplies
//! the camera as callbacks and polls for display frames.

use libc::{c_char, c_int, c_void, size_t};
use std::ffi::CStr;
use std::ptr;
use std::sync::Arc;

use vision_frame::UVec2;
use vision_ops::OperationRegistry;
use crossbeam::channel::Receiver;
use vision_worker::{
    LatestFrameSlot, Worker, WorkerConfig, WorkerError, WorkerEvent, WorkerExit, WorkerReport,
    WorkerStats,
};

mod registry_ffi;
mod source;
pub use registry_ffi::*;

use registry_ffi::take_builder;
use source::{CallbackSource, UserData};

// ============================================================================
// STATUS CODES
// ============================================================================

pub const VISION_OK: c_int = 0;
pub const VISION_ERR_NULL: c_int = -1;
pub const VISION_ERR_DEVICE_UNAVAILABLE: c_int = -2;
pub const VISION_ERR_UNKNOWN_OPERATION: c_int = -3;
pub const VISION_ERR_STOPPED: c_int = -4;
pub const VISION_ERR_BUFFER_TOO_SMALL: c_int = -5;
pub const VISION_ERR_NO_FRAME: c_int = -6;
pub const VISION_ERR_INVALID_UTF8: c_int = -7;
pub const VISION_ERR_INVALID_OPERATION: c_int = -8;
pub const VISION_ERR_SPAWN: c_int = -9;
pub const VISION_ERR_NOT_FINISHED: c_int = -10;
pub const VISION_ERR_NO_EVENT: c_int = -11;

pub const VISION_EXIT_STOPPED: c_int = 0;
pub const VISION_EXIT_NEVER_STARTED: c_int = 1;
pub const VISION_EXIT_PANICKED: c_int = 2;

pub const VISION_EVENT_STARTED: c_int = 1;
pub const VISION_EVENT_CAPTURE_STALLED: c_int = 2;
pub const VISION_EVENT_CAPTURE_RECOVERED: c_int = 3;
pub const VISION_EVENT_FINISHED: c_int = 4;

fn status_of(err: &WorkerError) -> c_int {
    match err {
        WorkerError::DeviceUnavailable { .. } => VISION_ERR_DEVICE_UNAVAILABLE,
        WorkerError::UnknownOperation(_) => VISION_ERR_UNKNOWN_OPERATION,
        WorkerError::Stopped => VISION_ERR_STOPPED,
        WorkerError::Spawn(_) => VISION_ERR_SPAWN,
        WorkerError::Registry(_) => VISION_ERR_INVALID_OPERATION,
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// Opaque handle to a preview worker (C-compatible)
pub struct VisionWorker {
    _private: [u8; 0],
}

/// Borrowed pixel buffer exchanged with callbacks
///
/// Tightly packed rows of 8-bit samples, `channels` bytes per pixel.
#[repr(C)]
pub struct VisionFrameView {
    pub data: *mut u8,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

/// Shape of the frame copied by `vision_worker_latest_frame`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct VisionFrameInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub byte_len: size_t,
    pub sequence: u64,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct VisionWorkerStats {
    pub frames_read: u64,
    pub frames_published: u64,
    pub transient_failures: u64,
    pub dropped_frames: u64,
    pub stall_episodes: u64,
}

/// Final status of a finished worker
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct VisionWorkerReport {
    /// One of the `VISION_EXIT_*` codes
    pub exit: c_int,
    /// Capture handle the loop ran on, 0 if none was opened
    pub capture: u64,
    pub stats: VisionWorkerStats,
}

/// One worker notification
///
/// `failures` is set for stall and recovery events, `capture` for started
/// events and `report` for the finished event.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct VisionWorkerEvent {
    /// One of the `VISION_EVENT_*` codes
    pub kind: c_int,
    pub failures: u32,
    pub capture: u64,
    pub report: VisionWorkerReport,
}

impl From<WorkerStats> for VisionWorkerStats {
    fn from(stats: WorkerStats) -> Self {
        VisionWorkerStats {
            frames_read: stats.frames_read,
            frames_published: stats.frames_published,
            transient_failures: stats.transient_failures,
            dropped_frames: stats.dropped_frames,
            stall_episodes: stats.stall_episodes,
        }
    }
}

impl From<&WorkerReport> for VisionWorkerReport {
    fn from(report: &WorkerReport) -> Self {
        VisionWorkerReport {
            exit: match report.exit {
                WorkerExit::Stopped => VISION_EXIT_STOPPED,
                WorkerExit::NeverStarted => VISION_EXIT_NEVER_STARTED,
                WorkerExit::Panicked => VISION_EXIT_PANICKED,
            },
            capture: report.capture.map_or(0, |id| id.get()),
            stats: report.stats.into(),
        }
    }
}

impl From<&WorkerEvent> for VisionWorkerEvent {
    fn from(event: &WorkerEvent) -> Self {
        let mut out = VisionWorkerEvent::default();
        match event {
            WorkerEvent::Started { capture } => {
                out.kind = VISION_EVENT_STARTED;
                out.capture = capture.get();
            }
            WorkerEvent::CaptureStalled {
                consecutive_failures,
            } => {
                out.kind = VISION_EVENT_CAPTURE_STALLED;
                out.failures = *consecutive_failures;
            }
            WorkerEvent::CaptureRecovered { after_failures } => {
                out.kind = VISION_EVENT_CAPTURE_RECOVERED;
                out.failures = *after_failures;
            }
            WorkerEvent::Finished(report) => {
                out.kind = VISION_EVENT_FINISHED;
                out.report = report.into();
                out.capture = out.report.capture;
            }
        }
        out
    }
}

/// Called once by `vision_worker_start` before the first read; non-zero
/// means the device is unavailable
pub type VisionOpenFn =
    Option<unsafe extern "C" fn(user_data: *mut c_void, device_index: u32) -> c_int>;

/// Fill `frame` and return 1, or return any other value for a failed read
///
/// The pixels only need to stay valid until the callback returns. Invoked
/// from a worker thread.
pub type VisionReadFn =
    Option<unsafe extern "C" fn(user_data: *mut c_void, frame: *mut VisionFrameView) -> c_int>;

struct WorkerHandle {
    worker: Worker,
    slot: Arc<LatestFrameSlot>,
    events: Receiver<WorkerEvent>,
}

unsafe fn handle<'a>(ptr: *const VisionWorker) -> Option<&'a WorkerHandle> {
    (ptr as *const WorkerHandle).as_ref()
}

// ============================================================================
// WORKER API
// ============================================================================

/// Create a worker reading from C callbacks
///
/// Takes ownership of `registry` (NULL means only "No Detection"). A zero
/// `box_width` or `box_height` selects the 640x480 default. Returns NULL
/// when `read_cb` is NULL.
///
/// # Safety
/// `registry` must be NULL or a live builder. `user_data` must stay valid
/// until `vision_worker_destroy` returns and be usable from other threads.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_create(
    registry: *mut VisionRegistryBuilder,
    device_index: u32,
    open_cb: VisionOpenFn,
    read_cb: VisionReadFn,
    user_data: *mut c_void,
    box_width: u32,
    box_height: u32,
) -> *mut VisionWorker {
    let registry = match take_builder(registry) {
        Some(builder) => builder.build(),
        None => OperationRegistry::identity_only(),
    };

    let source = match CallbackSource::new(open_cb, read_cb, UserData(user_data)) {
        Some(source) => source,
        None => return ptr::null_mut(),
    };

    // Callbacks may borrow host memory, so the reader is never detached
    let mut config = WorkerConfig {
        device_index,
        join_reader_on_drop: true,
        ..WorkerConfig::default()
    };
    if box_width > 0 && box_height > 0 {
        config.display_bounds = UVec2::new(box_width, box_height);
    }

    let slot = Arc::new(LatestFrameSlot::new());
    let worker = Worker::new(Box::new(source), slot.clone(), Arc::new(registry), config);

    let events = worker.events();
    let handle = Box::new(WorkerHandle {
        worker,
        slot,
        events,
    });
    Box::into_raw(handle) as *mut VisionWorker
}

/// Stop, join and free a worker
///
/// Blocks until a read callback still in progress has returned. No callback
/// runs after this function returns.
///
/// # Safety
/// Caller must ensure ptr is valid and not already freed.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_destroy(ptr: *mut VisionWorker) {
    if !ptr.is_null() {
        let _ = Box::from_raw(ptr as *mut WorkerHandle);
    }
}

/// Open the device and start previewing
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_start(ptr: *const VisionWorker) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };

    match handle.worker.start() {
        Ok(()) => VISION_OK,
        Err(e) => status_of(&e),
    }
}

/// Switch to "No Detection"
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_pause(ptr: *const VisionWorker) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };

    handle.worker.pause();
    VISION_OK
}

/// Activate an operation by display name
///
/// # Safety
/// Caller must ensure ptr is valid and name is a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_select_operation(
    ptr: *const VisionWorker,
    name: *const c_char,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    if name.is_null() {
        return VISION_ERR_NULL;
    }

    let name = match CStr::from_ptr(name).to_str() {
        Ok(name) => name,
        Err(_) => return VISION_ERR_INVALID_UTF8,
    };

    match handle.worker.select_operation(name) {
        Ok(()) => VISION_OK,
        Err(e) => status_of(&e),
    }
}

/// Request the loop to stop; idempotent
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_stop(ptr: *const VisionWorker) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };

    handle.worker.stop();
    VISION_OK
}

/// Copy the most recent display frame into `buffer`
///
/// `info_out` (optional) is filled whenever a frame exists, including when
/// the buffer is too small, so callers can size their buffer.
///
/// # Safety
/// Caller must ensure ptr is valid and buffer holds `buffer_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_latest_frame(
    ptr: *const VisionWorker,
    buffer: *mut u8,
    buffer_len: size_t,
    info_out: *mut VisionFrameInfo,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };

    let Some(latest) = handle.slot.latest() else {
        return VISION_ERR_NO_FRAME;
    };
    let data = latest.frame.data();

    if !info_out.is_null() {
        *info_out = VisionFrameInfo {
            width: latest.frame.width(),
            height: latest.frame.height(),
            channels: latest.frame.channels() as u32,
            byte_len: data.len(),
            sequence: latest.sequence,
        };
    }

    if buffer.is_null() || buffer_len < data.len() {
        return VISION_ERR_BUFFER_TOO_SMALL;
    }

    ptr::copy_nonoverlapping(data.as_ptr(), buffer, data.len());
    VISION_OK
}

/// Sequence number of the newest frame (0 before the first one)
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_frame_sequence(ptr: *const VisionWorker) -> u64 {
    match handle(ptr) {
        Some(handle) => handle.slot.sequence(),
        None => 0,
    }
}

/// Get worker statistics
///
/// # Safety
/// Caller must ensure ptr and stats_out are valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_stats(
    ptr: *const VisionWorker,
    stats_out: *mut VisionWorkerStats,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    if stats_out.is_null() {
        return VISION_ERR_NULL;
    }

    *stats_out = handle.worker.stats().into();
    VISION_OK
}

// ============================================================================
// COMPLETION AND EVENTS
// ============================================================================

/// Copy the final report if the worker has finished
///
/// Returns `VISION_ERR_NOT_FINISHED` while the worker is still running or
/// was never stopped.
///
/// # Safety
/// Caller must ensure ptr and report_out are valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_report(
    ptr: *const VisionWorker,
    report_out: *mut VisionWorkerReport,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    if report_out.is_null() {
        return VISION_ERR_NULL;
    }

    match handle.worker.report() {
        Some(report) => {
            *report_out = (&report).into();
            VISION_OK
        }
        None => VISION_ERR_NOT_FINISHED,
    }
}

/// Block until the worker has finished and copy its report
///
/// Returns immediately with `VISION_ERR_NOT_FINISHED` for a worker that was
/// neither started nor stopped. Call `vision_worker_stop` from another
/// thread to end a running worker.
///
/// # Safety
/// Caller must ensure ptr and report_out are valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_wait(
    ptr: *const VisionWorker,
    report_out: *mut VisionWorkerReport,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    if report_out.is_null() {
        return VISION_ERR_NULL;
    }

    match handle.worker.wait() {
        Some(report) => {
            *report_out = (&report).into();
            VISION_OK
        }
        None => VISION_ERR_NOT_FINISHED,
    }
}

/// Take the oldest undelivered worker event without blocking
///
/// # Safety
/// Caller must ensure ptr and event_out are valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_poll_event(
    ptr: *const VisionWorker,
    event_out: *mut VisionWorkerEvent,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    if event_out.is_null() {
        return VISION_ERR_NULL;
    }

    match handle.events.try_recv() {
        Ok(event) => {
            *event_out = (&event).into();
            VISION_OK
        }
        Err(_) => VISION_ERR_NO_EVENT,
    }
}

// ============================================================================
// OPERATION LISTING
// ============================================================================

/// Number of selectable operations, "No Detection" included
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_operation_count(ptr: *const VisionWorker) -> size_t {
    match handle(ptr) {
        Some(handle) => handle.worker.registry().len(),
        None => 0,
    }
}

/// Copy the name of operation `index` as a NUL-terminated string
///
/// # Safety
/// Caller must ensure ptr is valid and buffer holds `buffer_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn vision_worker_operation_name(
    ptr: *const VisionWorker,
    index: size_t,
    buffer: *mut c_char,
    buffer_len: size_t,
) -> c_int {
    let Some(handle) = handle(ptr) else {
        return VISION_ERR_NULL;
    };
    let Some(operation) = handle.worker.registry().get(index) else {
        return VISION_ERR_UNKNOWN_OPERATION;
    };

    let name = operation.name().as_bytes();
    if buffer.is_null() || buffer_len < name.len() + 1 {
        return VISION_ERR_BUFFER_TOO_SMALL;
    }

    ptr::copy_nonoverlapping(name.as_ptr() as *const c_char, buffer, name.len());
    *buffer.add(name.len()) = 0;
    VISION_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    struct TestCamera {
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        reads: AtomicUsize,
    }

    fn camera(width: u32, height: u32) -> Box<TestCamera> {
        Box::new(TestCamera {
            pixels: vec![0; (width * height * 3) as usize],
            width,
            height,
            reads: AtomicUsize::new(0),
        })
    }

    unsafe extern "C" fn read_camera(user_data: *mut c_void, frame: *mut VisionFrameView) -> c_int {
        let camera = &*(user_data as *const TestCamera);
        camera.reads.fetch_add(1, Ordering::Relaxed);
        thread::sleep(Duration::from_millis(1));

        (*frame).data = camera.pixels.as_ptr() as *mut u8;
        (*frame).width = camera.width;
        (*frame).height = camera.height;
        (*frame).channels = 3;
        1
    }

    /// Camera whose reads outlast the default read timeout
    #[derive(Default)]
    struct SlowCamera {
        in_read: AtomicBool,
        reads: AtomicUsize,
    }

    unsafe extern "C" fn read_slowly(user_data: *mut c_void, _frame: *mut VisionFrameView) -> c_int {
        let camera = &*(user_data as *const SlowCamera);
        camera.reads.fetch_add(1, Ordering::SeqCst);
        camera.in_read.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2500));
        camera.in_read.store(false, Ordering::SeqCst);
        0
    }

    unsafe extern "C" fn refuse_open(_user_data: *mut c_void, _device_index: u32) -> c_int {
        -1
    }

    unsafe extern "C" fn invert(_user_data: *mut c_void, frame: *mut VisionFrameView) {
        let frame = &mut *frame;
        let len = (frame.width * frame.height * frame.channels) as usize;
        for byte in std::slice::from_raw_parts_mut(frame.data, len) {
            *byte = 255 - *byte;
        }
    }

    unsafe fn create(camera: &TestCamera, open_cb: VisionOpenFn) -> *mut VisionWorker {
        let builder = vision_registry_builder_create();
        let name = CString::new("Invert").unwrap();
        assert_eq!(
            vision_registry_builder_register(builder, name.as_ptr(), Some(invert), ptr::null_mut()),
            VISION_OK
        );
        vision_worker_create(
            builder,
            0,
            open_cb,
            Some(read_camera),
            camera as *const TestCamera as *mut c_void,
            0,
            0,
        )
    }

    unsafe fn wait_for_frame(ptr: *const VisionWorker) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if vision_worker_frame_sequence(ptr) > 0 {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_create_without_read_callback() {
        unsafe {
            let ptr = vision_worker_create(ptr::null_mut(), 0, None, None, ptr::null_mut(), 0, 0);
            assert!(ptr.is_null());
        }
    }

    #[test]
    fn test_preview_through_callbacks() {
        let camera = camera(4, 4);
        unsafe {
            let ptr = create(&camera, None);
            assert!(!ptr.is_null());

            let name = CString::new("Invert").unwrap();
            assert_eq!(vision_worker_select_operation(ptr, name.as_ptr()), VISION_OK);
            assert_eq!(
                vision_worker_latest_frame(ptr, ptr::null_mut(), 0, ptr::null_mut()),
                VISION_ERR_NO_FRAME
            );
            assert_eq!(vision_worker_start(ptr), VISION_OK);
            assert!(wait_for_frame(ptr));

            let mut info = VisionFrameInfo::default();
            assert_eq!(
                vision_worker_latest_frame(ptr, ptr::null_mut(), 0, &mut info),
                VISION_ERR_BUFFER_TOO_SMALL
            );
            assert_eq!((info.width, info.height, info.channels), (480, 480, 3));

            let mut buffer = vec![0u8; info.byte_len];
            assert_eq!(
                vision_worker_latest_frame(ptr, buffer.as_mut_ptr(), buffer.len(), &mut info),
                VISION_OK
            );
            assert!(buffer.iter().all(|&b| b == 255));

            let mut stats = VisionWorkerStats::default();
            assert_eq!(vision_worker_stats(ptr, &mut stats), VISION_OK);
            assert!(stats.frames_published >= 1);

            assert_eq!(vision_worker_pause(ptr), VISION_OK);
            assert_eq!(vision_worker_stop(ptr), VISION_OK);
            assert_eq!(vision_worker_stop(ptr), VISION_OK);
            assert_eq!(vision_worker_start(ptr), VISION_ERR_STOPPED);
            vision_worker_destroy(ptr);
        }
        assert!(camera.reads.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn test_destroy_waits_for_blocked_read() {
        let camera = Box::new(SlowCamera::default());
        unsafe {
            let ptr = vision_worker_create(
                ptr::null_mut(),
                0,
                None,
                Some(read_slowly),
                &*camera as *const SlowCamera as *mut c_void,
                0,
                0,
            );
            assert_eq!(vision_worker_start(ptr), VISION_OK);

            let deadline = Instant::now() + Duration::from_secs(5);
            while !camera.in_read.load(Ordering::SeqCst) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
            assert!(camera.in_read.load(Ordering::SeqCst));

            vision_worker_destroy(ptr);
        }
        assert!(!camera.in_read.load(Ordering::SeqCst));
        assert_eq!(camera.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_report_and_events() {
        let camera = camera(2, 2);
        unsafe {
            let ptr = create(&camera, None);
            let mut report = VisionWorkerReport::default();
            let mut event = VisionWorkerEvent::default();

            assert_eq!(vision_worker_wait(ptr, &mut report), VISION_ERR_NOT_FINISHED);
            assert_eq!(vision_worker_poll_event(ptr, &mut event), VISION_ERR_NO_EVENT);

            assert_eq!(vision_worker_start(ptr), VISION_OK);
            assert!(wait_for_frame(ptr));
            assert_eq!(vision_worker_report(ptr, &mut report), VISION_ERR_NOT_FINISHED);

            assert_eq!(vision_worker_poll_event(ptr, &mut event), VISION_OK);
            assert_eq!(event.kind, VISION_EVENT_STARTED);
            let capture = event.capture;
            assert_ne!(capture, 0);

            assert_eq!(vision_worker_stop(ptr), VISION_OK);
            assert_eq!(vision_worker_wait(ptr, &mut report), VISION_OK);
            assert_eq!(report.exit, VISION_EXIT_STOPPED);
            assert_eq!(report.capture, capture);
            assert!(report.stats.frames_published >= 1);

            let mut again = VisionWorkerReport::default();
            assert_eq!(vision_worker_report(ptr, &mut again), VISION_OK);
            assert_eq!(again.stats.frames_read, report.stats.frames_read);

            assert_eq!(vision_worker_poll_event(ptr, &mut event), VISION_OK);
            assert_eq!(event.kind, VISION_EVENT_FINISHED);
            assert_eq!(event.report.exit, VISION_EXIT_STOPPED);
            assert_eq!(vision_worker_poll_event(ptr, &mut event), VISION_ERR_NO_EVENT);

            assert_eq!(vision_worker_report(ptr, ptr::null_mut()), VISION_ERR_NULL);
            vision_worker_destroy(ptr);
        }
    }

    #[test]
    fn test_stop_before_start_reports_never_started() {
        let camera = camera(2, 2);
        unsafe {
            let ptr = create(&camera, None);
            assert_eq!(vision_worker_stop(ptr), VISION_OK);

            let mut report = VisionWorkerReport::default();
            assert_eq!(vision_worker_report(ptr, &mut report), VISION_OK);
            assert_eq!(report.exit, VISION_EXIT_NEVER_STARTED);
            assert_eq!(report.capture, 0);
            vision_worker_destroy(ptr);
        }
    }

    #[test]
    fn test_open_failure_is_device_unavailable() {
        let camera = camera(2, 2);
        unsafe {
            let ptr = create(&camera, Some(refuse_open));
            assert_eq!(vision_worker_start(ptr), VISION_ERR_DEVICE_UNAVAILABLE);
            assert_eq!(vision_worker_frame_sequence(ptr), 0);
            vision_worker_destroy(ptr);
        }
        assert_eq!(camera.reads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_select_operation_errors() {
        let camera = camera(2, 2);
        unsafe {
            let ptr = create(&camera, None);

            let unknown = CString::new("Face Detection").unwrap();
            assert_eq!(
                vision_worker_select_operation(ptr, unknown.as_ptr()),
                VISION_ERR_UNKNOWN_OPERATION
            );

            let invalid = [0xffu8, 0xfe, 0];
            assert_eq!(
                vision_worker_select_operation(ptr, invalid.as_ptr() as *const c_char),
                VISION_ERR_INVALID_UTF8
            );
            assert_eq!(vision_worker_select_operation(ptr, ptr::null()), VISION_ERR_NULL);
            assert_eq!(vision_worker_start(ptr::null()), VISION_ERR_NULL);
            vision_worker_destroy(ptr);
        }
    }

    #[test]
    fn test_operation_names() {
        let camera = camera(2, 2);
        unsafe {
            let ptr = create(&camera, None);
            assert_eq!(vision_worker_operation_count(ptr), 2);

            let mut buffer = [0 as c_char; 32];
            assert_eq!(
                vision_worker_operation_name(ptr, 0, buffer.as_mut_ptr(), buffer.len()),
                VISION_OK
            );
            assert_eq!(CStr::from_ptr(buffer.as_ptr()).to_str().unwrap(), "No Detection");

            assert_eq!(
                vision_worker_operation_name(ptr, 1, buffer.as_mut_ptr(), 6),
                VISION_ERR_BUFFER_TOO_SMALL
            );
            assert_eq!(
                vision_worker_operation_name(ptr, 2, buffer.as_mut_ptr(), buffer.len()),
                VISION_ERR_UNKNOWN_OPERATION
            );
            vision_worker_destroy(ptr);
        }
    }
}
