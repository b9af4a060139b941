//! FFI bindings for ShakeIt
//!
//! This module provides C-compatible functions for embedding the detector in
//! a host application. Strings are null-terminated; strings returned by this
//! module must be freed with `shakeit_free_string`.
//!
//! Axis codes: X = 0, Y = 1, Z = 2.

use std::cell::RefCell;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Arc;

use crate::config::ShakeConfig;
use crate::detector::{ShakeDetector, ShakeObserver};
use crate::pipeline::replay_session;
use crate::types::{Sample, ShakeResolution};

/// Called with the winning axis code when an episode resolves
pub type AxisResolvedCallback = extern "C" fn(axis: i32, user_data: *mut c_void);

/// Called once when the accelerometer is unavailable
pub type SensorUnavailableCallback = extern "C" fn(user_data: *mut c_void);

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Helper to convert a Vec<String> to a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    // Each string is already valid JSON, so we join them as array elements
    let elements: Vec<&str> = vec.iter().map(|s| s.as_str()).collect();
    format!("[{}]", elements.join(","))
}

/// Observer that forwards to C function pointers
struct CallbackObserver {
    on_resolved: Option<AxisResolvedCallback>,
    on_unavailable: Option<SensorUnavailableCallback>,
    user_data: *mut c_void,
}

// The host owns `user_data` and guarantees it may be used from the threads
// that drive the detector.
unsafe impl Send for CallbackObserver {}
unsafe impl Sync for CallbackObserver {}

impl ShakeObserver for CallbackObserver {
    fn axis_resolved(&self, resolution: &ShakeResolution) {
        if let Some(callback) = self.on_resolved {
            callback(resolution.axis.code(), self.user_data);
        }
    }

    fn sensor_unavailable(&self) {
        if let Some(callback) = self.on_unavailable {
            callback(self.user_data);
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay a captured session and return a JSON array of resolution reports.
///
/// # Safety
/// - `input` must be a valid null-terminated C string (NDJSON or JSON array).
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `shakeit_free_string`.
/// - Returns NULL on error; call `shakeit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn shakeit_replay_session(
    input: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let input_str = match cstr_to_string(input) {
        Some(s) => s,
        None => {
            set_last_error("Invalid input string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        ShakeConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match ShakeConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match replay_session(input_str, &config) {
        Ok(reports) => string_to_cstr(&vec_to_json_array(reports)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Live Detector API
// ============================================================================

/// Opaque handle to a ShakeDetector
pub struct ShakeDetectorHandle {
    detector: ShakeDetector,
}

/// Create a detector.
///
/// `sample_interval_hz <= 0` selects the default 50 Hz. Callbacks may be NULL.
///
/// # Safety
/// - Returns a pointer to a newly allocated detector that must be freed with
///   `shakeit_detector_free`.
/// - Returns NULL on invalid configuration; call `shakeit_last_error`.
/// - Callbacks run on whichever thread calls `shakeit_detector_end` or
///   `shakeit_detector_sensor_unavailable`.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_new(
    axis_count: i32,
    threshold: f64,
    sample_interval_hz: f64,
    on_resolved: Option<AxisResolvedCallback>,
    on_unavailable: Option<SensorUnavailableCallback>,
    user_data: *mut c_void,
) -> *mut ShakeDetectorHandle {
    clear_last_error();

    let axis_count = match u8::try_from(axis_count) {
        Ok(count) => count,
        Err(_) => {
            set_last_error(&format!("Unsupported axis count {}", axis_count));
            return ptr::null_mut();
        }
    };

    let mut config = match ShakeConfig::new(axis_count, threshold) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    if sample_interval_hz > 0.0 {
        config = config.with_sample_interval_hz(sample_interval_hz);
    }

    let observer = Arc::new(CallbackObserver {
        on_resolved,
        on_unavailable,
        user_data,
    });

    match ShakeDetector::new(config, observer) {
        Ok(detector) => Box::into_raw(Box::new(ShakeDetectorHandle { detector })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a detector.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`, or NULL.
/// - No other thread may be using the handle.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_free(detector: *mut ShakeDetectorHandle) {
    if !detector.is_null() {
        let handle = Box::from_raw(detector);
        handle.detector.stop();
        drop(handle);
    }
}

/// Push one accelerometer reading. Pass non-zero `has_error` when the sensor
/// reported an error with this reading; it is dropped.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns 0 on success, -1 on error (including sensor unavailable).
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_push_sample(
    detector: *const ShakeDetectorHandle,
    x: f64,
    y: f64,
    z: f64,
    timestamp_ms: u64,
    has_error: i32,
) -> i32 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1;
    }

    let handle = &*detector;
    let sample = Sample::spatial(x, y, z, timestamp_ms);
    let error = if has_error != 0 {
        Some("sensor error")
    } else {
        None
    };

    match handle.detector.push_reading(&sample, error) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Signal the start of a shake.
///
/// `timestamp_ms` must come from the same clock as the sample timestamps;
/// the episode timeout compares the two.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns 1 if an episode opened, 0 if ignored, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_begin(
    detector: *const ShakeDetectorHandle,
    timestamp_ms: u64,
) -> i32 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1;
    }

    let handle = &*detector;
    i32::from(handle.detector.begin(timestamp_ms))
}

/// Signal the end of a shake. Invokes the resolved callback on success.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns the axis code, or -1 when no episode was open or on error.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_end(
    detector: *const ShakeDetectorHandle,
    timestamp_ms: u64,
) -> i32 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1;
    }

    let handle = &*detector;
    match handle.detector.end(timestamp_ms) {
        Some(resolution) => resolution.axis.code(),
        None => -1,
    }
}

/// Signal that the platform cancelled the shake.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns 1 if an episode was cancelled, 0 if ignored, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_cancel(
    detector: *const ShakeDetectorHandle,
    timestamp_ms: u64,
) -> i32 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1;
    }

    let handle = &*detector;
    i32::from(handle.detector.cancel(timestamp_ms))
}

/// Report that the accelerometer is unavailable for this session.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_sensor_unavailable(
    detector: *const ShakeDetectorHandle,
) -> i32 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1;
    }

    let handle = &*detector;
    handle.detector.report_sensor_unavailable();
    0
}

/// Stop processing samples. Safe to call more than once.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_stop(detector: *const ShakeDetectorHandle) {
    if !detector.is_null() {
        (*detector).detector.stop();
    }
}

/// Current per-axis totals as JSON (`{"x":..,"y":..,"z":..}`).
///
/// # Safety
/// - `detector` must be a valid pointer returned by `shakeit_detector_new`.
/// - Returns a newly allocated string that must be freed with `shakeit_free_string`.
/// - Returns NULL on error; call `shakeit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn shakeit_detector_totals_json(
    detector: *const ShakeDetectorHandle,
) -> *mut c_char {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return ptr::null_mut();
    }

    let handle = &*detector;
    match serde_json::to_string(&handle.detector.snapshot()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by ShakeIt functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a ShakeIt function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn shakeit_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next ShakeIt function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn shakeit_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    extern "C" fn record_axis(axis: i32, user_data: *mut c_void) {
        let slot = unsafe { &*(user_data as *const AtomicI32) };
        slot.store(axis, Ordering::SeqCst);
    }

    extern "C" fn record_unavailable(user_data: *mut c_void) {
        let slot = unsafe { &*(user_data as *const AtomicI32) };
        slot.store(99, Ordering::SeqCst);
    }

    fn last_error() -> Option<String> {
        unsafe {
            let ptr = shakeit_last_error();
            if ptr.is_null() {
                None
            } else {
                Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
            }
        }
    }

    #[test]
    fn test_detector_lifecycle_with_callback() {
        let slot = AtomicI32::new(-1);
        let user_data = &slot as *const AtomicI32 as *mut c_void;

        unsafe {
            let detector =
                shakeit_detector_new(3, 1.75, 50.0, Some(record_axis), None, user_data);
            assert!(!detector.is_null());

            assert_eq!(shakeit_detector_begin(detector, 0), 1);
            for i in 0..3 {
                assert_eq!(shakeit_detector_push_sample(detector, 0.0, 0.0, -2.0, i * 20, 0), 0);
            }
            assert_eq!(shakeit_detector_end(detector, 60), 2);
            assert_eq!(slot.load(Ordering::SeqCst), 2);

            assert_eq!(shakeit_detector_end(detector, 80), -1);

            shakeit_detector_stop(detector);
            shakeit_detector_stop(detector);
            shakeit_detector_free(detector);
        }
    }

    #[test]
    fn test_invalid_configuration_returns_null() {
        unsafe {
            let detector = shakeit_detector_new(5, 1.75, 50.0, None, None, ptr::null_mut());
            assert!(detector.is_null());
            assert!(last_error().unwrap().contains("axis count"));

            let detector = shakeit_detector_new(2, 0.0, 50.0, None, None, ptr::null_mut());
            assert!(detector.is_null());
            assert!(last_error().unwrap().contains("threshold"));
        }
    }

    #[test]
    fn test_sensor_unavailable_callback_and_rejection() {
        let slot = AtomicI32::new(0);
        let user_data = &slot as *const AtomicI32 as *mut c_void;

        unsafe {
            let detector =
                shakeit_detector_new(2, 1.75, 0.0, None, Some(record_unavailable), user_data);
            assert_eq!(shakeit_detector_sensor_unavailable(detector), 0);
            assert_eq!(slot.load(Ordering::SeqCst), 99);

            assert_eq!(shakeit_detector_push_sample(detector, 2.0, 0.0, 0.0, 0, 0), -1);
            assert!(last_error().unwrap().contains("not available"));
            shakeit_detector_free(detector);
        }
    }

    #[test]
    fn test_totals_json() {
        unsafe {
            let detector = shakeit_detector_new(3, 1.75, 50.0, None, None, ptr::null_mut());
            shakeit_detector_push_sample(detector, 2.0, 0.0, 0.0, 0, 0);
            shakeit_detector_push_sample(detector, 8.0, 0.0, 0.0, 20, 1);

            let json_ptr = shakeit_detector_totals_json(detector);
            let json = CStr::from_ptr(json_ptr).to_str().unwrap().to_string();
            shakeit_free_string(json_ptr);

            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["x"], 2.0);
            shakeit_detector_free(detector);
        }
    }

    #[test]
    fn test_replay_session_ffi() {
        let input = CString::new(
            r#"{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00Z","kind":"begin"}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.020Z","kind":"sample","x":0.0,"y":3.0}
{"schema_version":"shakeit.sensor_event.v1","timestamp":"2024-03-01T12:00:00.040Z","kind":"end"}"#,
        )
        .unwrap();
        let config = CString::new(r#"{"axes": 2}"#).unwrap();

        unsafe {
            let result = shakeit_replay_session(input.as_ptr(), config.as_ptr());
            assert!(!result.is_null());
            let json = CStr::from_ptr(result).to_str().unwrap().to_string();
            shakeit_free_string(result);

            let reports: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(reports.as_array().unwrap().len(), 1);
            assert_eq!(reports[0]["axis"], "y");
        }
    }

    #[test]
    fn test_null_pointers() {
        unsafe {
            assert!(shakeit_replay_session(ptr::null(), ptr::null()).is_null());
            assert_eq!(shakeit_detector_begin(ptr::null(), 0), -1);
            assert!(last_error().unwrap().contains("Null detector"));
            shakeit_detector_stop(ptr::null());
            shakeit_detector_free(ptr::null_mut());
            shakeit_free_string(ptr::null_mut());
        }
    }
}
