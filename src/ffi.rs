//! FFI bindings for Vitalscan
//!
//! This module provides C-compatible functions for calling Vitalscan from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `vitalscan_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::pipeline::{evaluate_json, validate_json, ScanProcessor};
use crate::source::SyntheticSource;
use crate::types::{CaptureDescriptor, ScanMode};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read the JSON and mode arguments shared by the stateless entry points
unsafe fn read_args(json: *const c_char, mode: *const c_char) -> Option<(String, ScanMode)> {
    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return None;
    };

    let Some(mode_str) = cstr_to_string(mode) else {
        set_last_error("Invalid mode string pointer");
        return None;
    };

    match mode_str.parse::<ScanMode>() {
        Ok(mode) => Some((json_str, mode)),
        Err(e) => {
            set_last_error(&e.to_string());
            None
        }
    }
}

fn finish(result: Result<String, ScanError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Evaluate a measurement JSON document and return the report JSON.
///
/// # Safety
/// - `json` and `mode` must be valid null-terminated C strings.
/// - `mode` is `"ppg"` or `"face"`.
/// - Returns a newly allocated string that must be freed with `vitalscan_free_string`.
/// - Returns NULL on error; call `vitalscan_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_evaluate_json(
    json: *const c_char,
    mode: *const c_char,
) -> *mut c_char {
    clear_last_error();

    match read_args(json, mode) {
        Some((json_str, mode)) => finish(evaluate_json(json_str, mode)),
        None => ptr::null_mut(),
    }
}

/// Validate a measurement JSON document and return the validation JSON.
///
/// # Safety
/// - `json` and `mode` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitalscan_free_string`.
/// - Returns NULL on error; call `vitalscan_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_validate_json(
    json: *const c_char,
    mode: *const c_char,
) -> *mut c_char {
    clear_last_error();

    match read_args(json, mode) {
        Some((json_str, mode)) => finish(validate_json(json_str, mode)),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a processor backed by the synthetic source
pub struct VitalscanProcessorHandle {
    processor: ScanProcessor<SyntheticSource>,
    runtime: tokio::runtime::Runtime,
}

/// Create a processor backed by a seeded synthetic source without latency.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `vitalscan_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_processor_new(seed: u64) -> *mut VitalscanProcessorHandle {
    clear_last_error();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let processor = ScanProcessor::new(SyntheticSource::deterministic(seed));
    Box::into_raw(Box::new(VitalscanProcessorHandle { processor, runtime }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalscan_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_processor_free(processor: *mut VitalscanProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Run one synthetic scan and return the report JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitalscan_processor_new`.
/// - `mode` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vitalscan_free_string`.
/// - Returns NULL on error; call `vitalscan_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_processor_scan(
    processor: *mut VitalscanProcessorHandle,
    mode: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let Some(mode_str) = cstr_to_string(mode) else {
        set_last_error("Invalid mode string pointer");
        return ptr::null_mut();
    };

    let result = mode_str.parse::<ScanMode>().and_then(|mode| {
        let descriptor = CaptureDescriptor::new(mode);
        let report = handle
            .runtime
            .block_on(handle.processor.scan(&descriptor, &CancellationToken::new()))?;
        serde_json::to_string_pretty(&report).map_err(|e| ScanError::EncodingError(e.to_string()))
    });

    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitalscan functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitalscan function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Vitalscan function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitalscan library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitalscan_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
