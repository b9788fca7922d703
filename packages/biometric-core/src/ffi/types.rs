//! # FFI Types
//!
//! C-compatible types for the biometric C ABI.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::{Error, Result};
use crate::outcome::AuthenticationOutcome;

/// FFI-safe result type
///
/// The C rendition of a transport result. Exactly one of `data` /
/// `error_message` is non-null. Free with [`bio_free_result`].
#[repr(C)]
#[derive(Debug)]
pub struct FfiResult {
    /// Success flag (1 = success, 0 = error)
    pub success: i32,
    /// Error code (0 if success)
    pub error_code: i32,
    /// Error message (null if success)
    pub error_message: *mut c_char,
    /// Result data (null if error)
    pub data: *mut c_char,
}

impl FfiResult {
    /// Create a successful result with data
    pub fn ok(data: &str) -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: into_c_string(data),
        }
    }

    /// Create a successful result without data
    pub fn ok_empty() -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: std::ptr::null_mut(),
        }
    }

    /// Create an error result
    pub fn err(code: i32, message: &str) -> Self {
        Self {
            success: 0,
            error_code: code,
            error_message: into_c_string(message),
            data: std::ptr::null_mut(),
        }
    }

    /// Create from a bridge error
    pub fn from_error(error: &Error) -> Self {
        Self::err(error.code(), &error.to_string())
    }

    /// Encode an authentication outcome (or the error that replaced it)
    pub fn from_outcome(result: Result<AuthenticationOutcome>, success_marker: &str) -> Self {
        match result {
            Ok(AuthenticationOutcome::Authenticated) => Self::ok(success_marker),
            Ok(failed) => match failed.to_error() {
                Some(error) => Self::from_error(&error),
                None => Self::ok(success_marker),
            },
            Err(error) => Self::from_error(&error),
        }
    }
}

/// Copy a Rust string into a C string owned by the caller
///
/// Interior NULs cannot be represented and are dropped.
pub(crate) fn into_c_string(s: &str) -> *mut c_char {
    let owned = if s.contains('\0') {
        s.replace('\0', "")
    } else {
        s.to_owned()
    };
    CString::new(owned).unwrap_or_default().into_raw()
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert a C string to a Rust String
///
/// # Safety
/// The caller must ensure the pointer is null or valid and null-terminated.
pub unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(String::from)
}

/// Free a C string allocated by Rust
///
/// # Safety
/// The pointer must have been allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn bio_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Free an FfiResult
///
/// # Safety
/// The FfiResult must have been created by this library and not freed yet.
#[no_mangle]
pub unsafe extern "C" fn bio_free_result(result: FfiResult) {
    if !result.error_message.is_null() {
        drop(CString::from_raw(result.error_message));
    }
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
}
