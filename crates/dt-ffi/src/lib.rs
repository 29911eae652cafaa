//! C ABI over the tensor loader.
//!
//! Host-framework shims (Python `ctypes`, a TensorFlow custom op, ...)
//! call these functions in place of their native file reads. Every
//! function returns a `DTStatus`; on failure the message is available from
//! `dt_last_error` on the same thread.

mod context;
mod error;
mod types;

pub use context::*;
pub use error::*;
pub use types::*;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::AssertUnwindSafe;

/// Execute a closure that returns a `DTStatus`, catching any panics
/// and converting them into `DTStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> DTStatus>(f: F) -> DTStatus {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            DTStatus::ErrorInternal
        }
    }
}

/// Borrow a C string argument as UTF-8.
unsafe fn str_arg<'a>(s: *const c_char, what: &str) -> Result<&'a str, DTStatus> {
    if s.is_null() {
        set_last_error(format!("{} is null", what));
        return Err(DTStatus::ErrorInvalidArgument);
    }
    CStr::from_ptr(s).to_str().map_err(|e| {
        set_last_error(format!("invalid {}: {}", what, e));
        DTStatus::ErrorInvalidArgument
    })
}

/// Move a vector to the C side as a raw pointer and length.
fn leak<T>(v: Vec<T>) -> (*mut T, usize) {
    let boxed = v.into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed) as *mut T, len)
}

/// Reclaim a pointer produced by `leak`.
unsafe fn reclaim<T>(ptr: *mut T, len: usize) {
    if !ptr.is_null() {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

/// Create a loader context configured from the environment.
///
/// On success, writes a heap-allocated `DTContext` pointer into `*ctx_out`.
/// The caller must later call `dt_context_destroy`.
#[no_mangle]
pub extern "C" fn dt_context_create(ctx_out: *mut *mut DTContext) -> DTStatus {
    catch_panic(|| {
        if ctx_out.is_null() {
            set_last_error("ctx_out is null".to_string());
            return DTStatus::ErrorInvalidArgument;
        }
        let ctx = Box::new(DTContext::from_env());
        unsafe {
            *ctx_out = Box::into_raw(ctx);
        }
        DTStatus::Ok
    })
}

/// Destroy a context previously created by `dt_context_create`.
///
/// Passing a null pointer is a no-op and returns `DTStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn dt_context_destroy(ctx: *mut DTContext) -> DTStatus {
    if ctx.is_null() {
        return DTStatus::Ok;
    }
    drop(Box::from_raw(ctx));
    DTStatus::Ok
}

/// Report which backend `path` would be read with, without reading it.
#[no_mangle]
pub unsafe extern "C" fn dt_classify(
    ctx: *const DTContext,
    path: *const c_char,
    kind_out: *mut DTBackendKind,
) -> DTStatus {
    catch_panic(|| {
        if ctx.is_null() || kind_out.is_null() {
            set_last_error("null argument".to_string());
            return DTStatus::ErrorInvalidArgument;
        }
        let path = match unsafe { str_arg(path, "path") } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let ctx = unsafe { &*ctx };
        unsafe { *kind_out = ctx.loader.classify(path).into() };
        DTStatus::Ok
    })
}

/// Read and decode the tensor at `path`, cast to the dtype with code
/// `dtype` (see `DTDType`).
///
/// On success fills `*out`; release it with `dt_tensor_free`.
#[no_mangle]
pub unsafe extern "C" fn dt_read_tensor(
    ctx: *const DTContext,
    path: *const c_char,
    dtype: u32,
    out: *mut DTTensor,
) -> DTStatus {
    catch_panic(|| {
        if ctx.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return DTStatus::ErrorInvalidArgument;
        }
        let path = match unsafe { str_arg(path, "path") } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let requested = match DTDType::from_code(dtype) {
            Some(d) => d,
            None => {
                set_last_error(format!("unknown dtype code {}", dtype));
                return DTStatus::ErrorInvalidArgument;
            }
        };
        let ctx = unsafe { &*ctx };

        let tensor = match ctx.loader.read_tensor(path, requested.into()) {
            Ok(t) => t,
            Err(e) => return report(e),
        };

        let (shape, ndim) = leak(tensor.shape().dims().to_vec());
        let (data, len) = leak(tensor.to_le_bytes());
        unsafe {
            *out = DTTensor {
                data,
                len,
                shape,
                ndim,
                dtype: tensor.dtype().into(),
            };
        }
        DTStatus::Ok
    })
}

/// Free the memory owned by a tensor filled in by `dt_read_tensor` and
/// reset it to empty. Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn dt_tensor_free(tensor: *mut DTTensor) {
    if tensor.is_null() {
        return;
    }
    let t = &mut *tensor;
    reclaim(t.data, t.len);
    reclaim(t.shape, t.ndim);
    *t = DTTensor::empty();
}

/// Read the object at `path` as opaque bytes.
///
/// On success fills `*out`; release it with `dt_buffer_free`.
#[no_mangle]
pub unsafe extern "C" fn dt_read_raw_bytes(
    ctx: *const DTContext,
    path: *const c_char,
    out: *mut DTBuffer,
) -> DTStatus {
    catch_panic(|| {
        if ctx.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return DTStatus::ErrorInvalidArgument;
        }
        let path = match unsafe { str_arg(path, "path") } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let ctx = unsafe { &*ctx };

        match ctx.loader.read_raw_bytes(path) {
            Ok(buffer) => {
                let (data, len) = leak(buffer.into_vec());
                unsafe { *out = DTBuffer { data, len } };
                DTStatus::Ok
            }
            Err(e) => report(e),
        }
    })
}

/// Free a buffer filled in by `dt_read_raw_bytes` and reset it to empty.
/// Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn dt_buffer_free(buffer: *mut DTBuffer) {
    if buffer.is_null() {
        return;
    }
    let b = &mut *buffer;
    reclaim(b.data, b.len);
    *b = DTBuffer::empty();
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error on
/// this thread, or null if there is none. The caller must free the
/// returned string with `dt_free_string`.
#[no_mangle]
pub extern "C" fn dt_last_error() -> *mut c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by `dt_last_error`.
#[no_mangle]
pub unsafe extern "C" fn dt_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
