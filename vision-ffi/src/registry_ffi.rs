//! Operation registry FFI bindings
//!
//! C hosts register their transforms here before creating a worker.

use crate::source::UserData;
use crate::{
    VisionFrameView, VISION_ERR_INVALID_OPERATION, VISION_ERR_INVALID_UTF8, VISION_ERR_NULL,
    VISION_OK,
};
use libc::{c_char, c_int, c_void};
use std::ffi::CStr;
use vision_frame::Frame;
use vision_ops::{OperationRegistry, RegistryBuilder};

/// Opaque handle to a registry under construction (C-compatible)
pub struct VisionRegistryBuilder {
    _private: [u8; 0],
}

/// Transform `frame` in place; width, height and channels must not change
pub type VisionTransformFn =
    Option<unsafe extern "C" fn(user_data: *mut c_void, frame: *mut VisionFrameView)>;

pub(crate) unsafe fn take_builder(ptr: *mut VisionRegistryBuilder) -> Option<RegistryBuilder> {
    if ptr.is_null() {
        None
    } else {
        Some(*Box::from_raw(ptr as *mut RegistryBuilder))
    }
}

// ============================================================================
// REGISTRY BUILDER API
// ============================================================================

/// Create a builder holding only "No Detection"
///
/// # Safety
/// Safe to call.
#[no_mangle]
pub unsafe extern "C" fn vision_registry_builder_create() -> *mut VisionRegistryBuilder {
    let builder = Box::new(OperationRegistry::builder());
    Box::into_raw(builder) as *mut VisionRegistryBuilder
}

/// Register a transform under a display name
///
/// Empty, duplicate and reserved names are rejected with
/// `VISION_ERR_INVALID_OPERATION`; the builder is unchanged in that case.
///
/// # Safety
/// Caller must ensure ptr is valid and name is a NUL-terminated string.
/// `user_data` must stay valid for the lifetime of the worker built from
/// this registry and be usable from other threads.
#[no_mangle]
pub unsafe extern "C" fn vision_registry_builder_register(
    ptr: *mut VisionRegistryBuilder,
    name: *const c_char,
    transform: VisionTransformFn,
    user_data: *mut c_void,
) -> c_int {
    if ptr.is_null() || name.is_null() {
        return VISION_ERR_NULL;
    }
    let Some(transform) = transform else {
        return VISION_ERR_NULL;
    };
    let name = match CStr::from_ptr(name).to_str() {
        Ok(name) => name,
        Err(_) => return VISION_ERR_INVALID_UTF8,
    };

    let builder = &mut *(ptr as *mut RegistryBuilder);
    let context = UserData(user_data);

    let result = builder.add(name, move |mut frame: Frame| {
        let mut view = VisionFrameView {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels() as u32,
            data: frame.data_mut().as_mut_ptr(),
        };
        unsafe { transform(context.get(), &mut view) };
        frame
    });

    match result {
        Ok(()) => VISION_OK,
        Err(e) => {
            log::warn!("Rejected operation from C host: {}", e);
            VISION_ERR_INVALID_OPERATION
        }
    }
}

/// Free a builder that was not handed to `vision_worker_create`
///
/// # Safety
/// Caller must ensure ptr is valid and not already freed.
#[no_mangle]
pub unsafe extern "C" fn vision_registry_builder_destroy(ptr: *mut VisionRegistryBuilder) {
    drop(take_builder(ptr));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    unsafe extern "C" fn fill_seven(_user_data: *mut c_void, frame: *mut VisionFrameView) {
        let frame = &mut *frame;
        let len = (frame.width * frame.height * frame.channels) as usize;
        std::slice::from_raw_parts_mut(frame.data, len).fill(7);
    }

    #[test]
    fn test_register_and_apply() {
        unsafe {
            let builder = vision_registry_builder_create();
            let name = CString::new("Fill").unwrap();
            assert_eq!(
                vision_registry_builder_register(builder, name.as_ptr(), Some(fill_seven), ptr::null_mut()),
                VISION_OK
            );

            let registry = take_builder(builder).unwrap().build();
            let out = registry
                .lookup("Fill")
                .unwrap()
                .apply(Frame::filled(2, 2, 3, 0).unwrap());
            assert!(out.data().iter().all(|&b| b == 7));
        }
    }

    #[test]
    fn test_rejected_names() {
        unsafe {
            let builder = vision_registry_builder_create();
            let fill = CString::new("Fill").unwrap();
            let reserved = CString::new("No Detection").unwrap();

            assert_eq!(
                vision_registry_builder_register(builder, fill.as_ptr(), Some(fill_seven), ptr::null_mut()),
                VISION_OK
            );
            assert_eq!(
                vision_registry_builder_register(builder, fill.as_ptr(), Some(fill_seven), ptr::null_mut()),
                VISION_ERR_INVALID_OPERATION
            );
            assert_eq!(
                vision_registry_builder_register(builder, reserved.as_ptr(), Some(fill_seven), ptr::null_mut()),
                VISION_ERR_INVALID_OPERATION
            );
            assert_eq!(
                vision_registry_builder_register(builder, fill.as_ptr(), None, ptr::null_mut()),
                VISION_ERR_NULL
            );
            vision_registry_builder_destroy(builder);
        }
    }
}
