//! FFI bindings for the TCU coach
//!
//! This module provides C-compatible functions for calling the coach from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `coach_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapters::{JsonActivitySource, PayloadFormat};
use crate::config::CoachConfig;
use crate::error::ComputeError;
use crate::pipeline::{analyze_json, coach_from_json, CoachSession};
use crate::types::{DailyWorkout, UserSubjectiveData};
use crate::zwo::ZwoEncoder;

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

unsafe fn required_arg(ptr: *const c_char, name: &str) -> Result<String, ComputeError> {
    cstr_to_string(ptr)
        .ok_or_else(|| ComputeError::ParseError(format!("Invalid {name} string pointer")))
}

/// NULL selects the Strava shape
unsafe fn format_arg(ptr: *const c_char) -> Result<PayloadFormat, ComputeError> {
    match cstr_to_string(ptr) {
        Some(s) => s.parse(),
        None => Ok(PayloadFormat::default()),
    }
}

/// NULL selects the default configuration
unsafe fn config_arg(ptr: *const c_char) -> Result<CoachConfig, ComputeError> {
    match cstr_to_string(ptr) {
        Some(json) => CoachConfig::from_json(&json),
        None => Ok(CoachConfig::default()),
    }
}

/// Return the string on success, or record the error and return NULL
fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Run a full coaching cycle on the latest activity and return the report JSON.
///
/// # Safety
/// - `activity_json` and `subjective_json` must be valid null-terminated C strings.
/// - `format` ("strava" or "proxy") and `config_json` may be NULL for defaults.
/// - Returns a newly allocated string that must be freed with `coach_free_string`.
/// - Returns NULL on error; call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_prescribe_json(
    format: *const c_char,
    activity_json: *const c_char,
    subjective_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, ComputeError> {
        let format = format_arg(format)?;
        let activity = required_arg(activity_json, "activity JSON")?;
        let subjective = required_arg(subjective_json, "subjective JSON")?;
        let config = config_arg(config_json)?;
        coach_from_json(format, &activity, &subjective, &config)
    })();

    finish(result)
}

/// Analyze the latest activity and return the analysis JSON (`null` when the
/// payload holds no activity).
///
/// # Safety
/// - `activity_json` must be a valid null-terminated C string.
/// - `format` and `config_json` may be NULL for defaults.
/// - Returns a newly allocated string that must be freed with `coach_free_string`.
/// - Returns NULL on error; call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_analyze_json(
    format: *const c_char,
    activity_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, ComputeError> {
        let format = format_arg(format)?;
        let activity = required_arg(activity_json, "activity JSON")?;
        let config = config_arg(config_json)?;
        let analysis = analyze_json(format, &activity, None, None, &config)?;
        Ok(serde_json::to_string(&analysis)?)
    })();

    finish(result)
}

/// Export a workout (`DailyWorkout` JSON) as a ZWO document.
///
/// # Safety
/// - `workout_json` must be a valid null-terminated C string.
/// - `author` may be NULL for the default author.
/// - Returns a newly allocated string that must be freed with `coach_free_string`.
/// - Returns NULL on error; call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_workout_to_zwo(
    workout_json: *const c_char,
    author: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, ComputeError> {
        let json = required_arg(workout_json, "workout JSON")?;
        let workout: DailyWorkout = serde_json::from_str(&json)?;
        let encoder = match cstr_to_string(author) {
            Some(author) => ZwoEncoder::new(&author),
            None => ZwoEncoder::default(),
        };
        encoder.encode(&workout)
    })();

    finish(result)
}

// ============================================================================
// Stateful Session API
// ============================================================================

/// Opaque handle to a CoachSession
pub struct CoachSessionHandle {
    session: CoachSession,
}

/// Create a new coaching session.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration.
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `coach_session_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn coach_session_new(config_json: *const c_char) -> *mut CoachSessionHandle {
    clear_last_error();

    match config_arg(config_json) {
        Ok(config) => Box::into_raw(Box::new(CoachSessionHandle {
            session: CoachSession::with_config(config),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a coaching session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `coach_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn coach_session_free(session: *mut CoachSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Ingest the latest activity of a payload and return the analysis JSON.
///
/// Returns the string `null` when the payload holds no activity.
///
/// # Safety
/// - `session` must be a valid pointer returned by `coach_session_new`.
/// - `activity_json` must be a valid null-terminated C string; `format` may be NULL.
/// - Returns a newly allocated string that must be freed with `coach_free_string`.
/// - Returns NULL on error; call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_session_ingest(
    session: *mut CoachSessionHandle,
    format: *const c_char,
    activity_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &mut *session;

    let result = (|| -> Result<String, ComputeError> {
        let format = format_arg(format)?;
        let json = required_arg(activity_json, "activity JSON")?;
        let source = JsonActivitySource::from_payload(format.adapter(), &json)?;
        let analysis = handle.session.ingest_from(&source, None)?;
        Ok(serde_json::to_string(&analysis)?)
    })();

    finish(result)
}

/// Set a user-entered FTP (50-600 W) and rebuild the session's hard data.
///
/// # Safety
/// - `session` must be a valid pointer returned by `coach_session_new`.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_session_set_ftp(session: *mut CoachSessionHandle, ftp: f64) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }

    let handle = &mut *session;

    match handle.session.set_ftp_override(ftp) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Submit the subjective report and return the prescription JSON.
///
/// Returns the string `null` for a resubmission, which is ignored.
///
/// # Safety
/// - `session` must be a valid pointer returned by `coach_session_new`.
/// - `subjective_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `coach_free_string`.
/// - Returns NULL on error; call `coach_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn coach_session_submit(
    session: *mut CoachSessionHandle,
    subjective_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &mut *session;

    let result = (|| -> Result<String, ComputeError> {
        let json = required_arg(subjective_json, "subjective JSON")?;
        let subjective: UserSubjectiveData = serde_json::from_str(&json)?;
        let prescription = handle.session.submit_diagnostic(subjective)?;
        Ok(serde_json::to_string(&prescription)?)
    })();

    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by coach functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a coach function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn coach_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next coach function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn coach_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn coach_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_activity_json() -> CString {
        CString::new(
            r#"[{
                "id": 3001,
                "name": "Sweet Spot",
                "moving_time": 3600,
                "start_date": "2024-07-01T06:00:00Z",
                "weighted_average_watts": 180,
                "streams": [{"type": "watts", "data": [150, 180, 210], "series_type": "time", "original_size": 3, "resolution": "high"}]
            }]"#,
        )
        .unwrap()
    }

    fn sample_subjective_json() -> CString {
        CString::new(r#"{"rpe": 2, "soreness": false, "sleep_quality": "good", "feeling": "fresh"}"#)
            .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        coach_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_prescribe_json() {
        let activity = sample_activity_json();
        let subjective = sample_subjective_json();

        unsafe {
            let result = coach_prescribe_json(
                ptr::null(),
                activity.as_ptr(),
                subjective.as_ptr(),
                ptr::null(),
            );
            let report: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(report["producer"]["name"], "tcu-coach");
            assert_eq!(report["decision"]["type"], "ADAPTIVE_CAP");
        }
    }

    #[test]
    fn test_ffi_analyze_json_with_config() {
        let activity = sample_activity_json();
        let format = CString::new("strava").unwrap();
        let config = CString::new(r#"{"default_ftp": 180}"#).unwrap();

        unsafe {
            let result = coach_analyze_json(format.as_ptr(), activity.as_ptr(), config.as_ptr());
            let analysis: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(analysis["hard_data"]["ftp"], 180);
            assert_eq!(analysis["hard_data"]["yesterday_tss"], 100);
            assert_eq!(analysis["streams"]["has_power"], true);
        }
    }

    #[test]
    fn test_ffi_session_lifecycle() {
        unsafe {
            let session = coach_session_new(ptr::null());
            assert!(!session.is_null());

            let activity = sample_activity_json();
            let analysis = coach_session_ingest(session, ptr::null(), activity.as_ptr());
            assert!(take_string(analysis).contains("hard_data"));

            assert_eq!(coach_session_set_ftp(session, 220.0), 0);
            assert_ne!(coach_session_set_ftp(session, 20.0), 0);
            assert!(!coach_last_error().is_null());

            let subjective = sample_subjective_json();
            let first = take_string(coach_session_submit(session, subjective.as_ptr()));
            assert!(first.contains("workout"));

            let second = take_string(coach_session_submit(session, subjective.as_ptr()));
            assert_eq!(second, "null");

            coach_session_free(session);
        }
    }

    #[test]
    fn test_ffi_workout_to_zwo() {
        let workout = crate::workout::generate_from_tag("TARGET", "Go").unwrap();
        let json = CString::new(serde_json::to_string(&workout).unwrap()).unwrap();

        unsafe {
            let xml = take_string(coach_workout_to_zwo(json.as_ptr(), ptr::null()));
            assert!(xml.starts_with("<workout_file>"));
            assert!(xml.contains("<author>TCU Coach</author>"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let subjective = sample_subjective_json();

            let result = coach_prescribe_json(
                ptr::null(),
                invalid_json.as_ptr(),
                subjective.as_ptr(),
                ptr::null(),
            );
            assert!(result.is_null());

            let error = coach_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_unknown_format() {
        let activity = sample_activity_json();
        let format = CString::new("garmin").unwrap();
        unsafe {
            let result = coach_analyze_json(format.as_ptr(), activity.as_ptr(), ptr::null());
            assert!(result.is_null());
            let error = CStr::from_ptr(coach_last_error()).to_str().unwrap();
            assert!(error.contains("garmin"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = coach_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
