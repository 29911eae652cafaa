use std::cell::RefCell;
use std::ffi::CString;

use dt_store::StoreError;

use crate::types::DTStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `dt_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Record `err` as the last error and map it to a status code.
pub fn report(err: StoreError) -> DTStatus {
    let status = match &err {
        StoreError::InvalidPathKind(_) => DTStatus::ErrorInvalidPath,
        StoreError::BufferSizeMismatch { .. }
        | StoreError::ShapeMismatch { .. }
        | StoreError::Tensor(_) => DTStatus::ErrorSizeMismatch,
        StoreError::Io { .. } | StoreError::Container { .. } => DTStatus::ErrorIo,
        StoreError::BackendUnavailable(_) | StoreError::UnsupportedDType(_) => {
            DTStatus::ErrorUnsupported
        }
    };
    set_last_error(err.to_string());
    status
}
