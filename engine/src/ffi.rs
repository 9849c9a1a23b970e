//! C ABI for embedding the engine in non-Rust hosts.
//!
//! Schemas, values and filter states cross the boundary as JSON strings.
//!
//! # Memory Management
//!
//! - Strings returned by `dashkit_*` functions are allocated by Rust
//! - Caller must free them with `dashkit_string_free`
//! - `dashkit_version` returns a static string that must not be freed
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure

use crate::{
    derive_defaults, from_url_params, initial_state, page_numbers, to_query, to_url_params,
    validate_filter_state, FieldErrors, FilterSchema, FilterState, FormSchema, SchemaValidator,
    UrlParams,
};
use serde::de::DeserializeOwned;
use std::ffi::{c_char, CStr, CString};

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

impl<T: serde::Serialize> From<Result<T, String>> for FfiResult<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => FfiResult::ok(value),
            Err(message) => FfiResult::err(message),
        }
    }
}

/// Outcome of a validation call.
#[derive(serde::Serialize)]
struct Validation {
    valid: bool,
    errors: FieldErrors,
}

impl From<Result<(), FieldErrors>> for Validation {
    fn from(result: Result<(), FieldErrors>) -> Self {
        match result {
            Ok(()) => Validation {
                valid: true,
                errors: FieldErrors::new(),
            },
            Err(errors) => Validation {
                valid: false,
                errors,
            },
        }
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `dashkit_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::from(c"{\"error\":\"string contained null bytes\"}").into_raw(),
    }
}

fn respond<T: serde::Serialize>(result: Result<T, String>) -> *mut c_char {
    to_c_string(FfiResult::from(result).to_json())
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Read and decode one JSON argument.
unsafe fn parse_arg<T: DeserializeOwned>(ptr: *const c_char, what: &str) -> Result<T, String> {
    let raw = from_c_string(ptr).ok_or_else(|| format!("invalid {what}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse error: {}", e))
}

// ============================================================================
// Forms
// ============================================================================

/// Derive the initial value tree of a form schema.
///
/// # Returns
/// JSON string: `{"ok": {...values}}` or `{"error": "message"}`
///
/// # Safety
/// - `schema_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_form_defaults(schema_json: *const c_char) -> *mut c_char {
    respond(parse_arg::<FormSchema>(schema_json, "schema JSON").map(|schema| derive_defaults(&schema)))
}

/// Validate a value tree against a form schema.
///
/// # Returns
/// JSON string: `{"ok": {"valid": bool, "errors": {path: message}}}` or
/// `{"error": "message"}` when the schema itself is unusable
///
/// # Safety
/// - `schema_json` and `values_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_form_validate(
    schema_json: *const c_char,
    values_json: *const c_char,
) -> *mut c_char {
    let result = parse_arg::<FormSchema>(schema_json, "schema JSON").and_then(|schema| {
        let values: serde_json::Value = parse_arg(values_json, "values JSON")?;
        schema.check().map_err(|e| e.to_string())?;
        let validator = SchemaValidator::new(&schema).map_err(|e| e.to_string())?;
        Ok(Validation::from(validator.validate(&values)))
    });
    respond(result)
}

// ============================================================================
// Filters
// ============================================================================

/// Initial filter state of a filter schema.
///
/// # Safety
/// - `schema_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_filter_initial_state(schema_json: *const c_char) -> *mut c_char {
    let result = parse_arg::<FilterSchema>(schema_json, "schema JSON").and_then(|schema| {
        schema.check().map_err(|e| e.to_string())?;
        Ok(initial_state(&schema))
    });
    respond(result)
}

/// Translate a filter state into a query object.
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_filter_to_query(state_json: *const c_char) -> *mut c_char {
    respond(parse_arg::<FilterState>(state_json, "state JSON").map(|state| to_query(&state)))
}

/// Encode a filter state as a URL query string (without leading `?`).
///
/// # Safety
/// - `state_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_filter_to_url(state_json: *const c_char) -> *mut c_char {
    respond(
        parse_arg::<FilterState>(state_json, "state JSON")
            .map(|state| to_url_params(&state).to_query_string()),
    )
}

/// Decode a URL query string into a filter state.
///
/// Parameters that do not fit the schema are dropped.
///
/// # Safety
/// - `schema_json` and `query` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_filter_from_url(
    schema_json: *const c_char,
    query: *const c_char,
) -> *mut c_char {
    let result = parse_arg::<FilterSchema>(schema_json, "schema JSON").and_then(|schema| {
        let query = from_c_string(query).ok_or("invalid query string")?;
        Ok(from_url_params(&UrlParams::parse(&query), &schema))
    });
    respond(result)
}

/// Validate a filter state against a filter schema.
///
/// # Returns
/// JSON string: `{"ok": {"valid": bool, "errors": {field: message}}}` or
/// `{"error": "message"}`
///
/// # Safety
/// - `state_json` and `schema_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `dashkit_string_free`
#[no_mangle]
pub unsafe extern "C" fn dashkit_filter_validate(
    state_json: *const c_char,
    schema_json: *const c_char,
) -> *mut c_char {
    let result = parse_arg::<FilterState>(state_json, "state JSON").and_then(|state| {
        let schema: FilterSchema = parse_arg(schema_json, "schema JSON")?;
        Ok(Validation::from(validate_filter_state(&state, &schema)))
    });
    respond(result)
}

// ============================================================================
// Utility
// ============================================================================

/// Page links for a pagination control, e.g. `[1,2,3,4,5,"...",20]`.
///
/// # Safety
/// Caller must free the returned string with `dashkit_string_free`.
#[no_mangle]
pub extern "C" fn dashkit_page_numbers(current: u32, total: u32) -> *mut c_char {
    respond(Ok(page_numbers(current as usize, total as usize)))
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `dashkit_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn dashkit_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn dashkit_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::ptr;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    /// Take ownership of a returned string and decode it.
    unsafe fn take(ptr: *mut c_char) -> Value {
        let text = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        dashkit_string_free(ptr);
        serde_json::from_str(&text).unwrap()
    }

    fn form_schema() -> CString {
        c(r#"{
            "fields": [
                {"name": "name", "type": "text", "required": true,
                 "rules": [{"type": "minLength", "value": 2}]},
                {"name": "tags", "type": "array", "itemField": {"name": "tag", "type": "text"}},
                {"name": "agree", "type": "checkbox"}
            ]
        }"#)
    }

    fn filter_schema() -> CString {
        c(r#"{
            "status": {"type": "select", "label": "Status",
                       "options": [{"label": "Active", "value": "active"}]},
            "age": {"type": "number", "label": "Age", "validation": {"min": 18}}
        }"#)
    }

    #[test]
    fn ffi_form_defaults() {
        unsafe {
            let result = take(dashkit_form_defaults(form_schema().as_ptr()));
            assert_eq!(result, json!({"ok": {"tags": [], "agree": false}}));
        }
    }

    #[test]
    fn ffi_form_validate() {
        unsafe {
            let schema = form_schema();
            let values = c(r#"{"name": "A"}"#);
            let result = take(dashkit_form_validate(schema.as_ptr(), values.as_ptr()));
            assert_eq!(result["ok"]["valid"], json!(false));
            assert_eq!(result["ok"]["errors"]["name"], json!("Must be at least 2 characters"));

            let values = c(r#"{"name": "Alice"}"#);
            let result = take(dashkit_form_validate(schema.as_ptr(), values.as_ptr()));
            assert_eq!(result, json!({"ok": {"valid": true, "errors": {}}}));
        }
    }

    #[test]
    fn ffi_filter_roundtrip() {
        unsafe {
            let schema = filter_schema();
            let state = take(dashkit_filter_initial_state(schema.as_ptr()));
            assert_eq!(state["ok"]["age"]["operator"], json!("$eq"));

            let state = c(r#"{
                "status": {"value": "active", "operator": "$eq"},
                "age": {"value": 30, "operator": "$gte"}
            }"#);
            let query = take(dashkit_filter_to_query(state.as_ptr()));
            assert_eq!(query["ok"]["age"], json!({"$gte": 30}));

            let url = take(dashkit_filter_to_url(state.as_ptr()));
            let url = c(url["ok"].as_str().unwrap());
            let decoded = take(dashkit_filter_from_url(schema.as_ptr(), url.as_ptr()));
            assert_eq!(decoded["ok"]["age"], json!({"value": 30, "operator": "$gte"}));
            assert_eq!(decoded["ok"]["status"]["value"], json!("active"));
        }
    }

    #[test]
    fn ffi_filter_validate() {
        unsafe {
            let state = c(r#"{"age": {"value": 12, "operator": "$eq"}}"#);
            let result = take(dashkit_filter_validate(state.as_ptr(), filter_schema().as_ptr()));
            assert_eq!(result["ok"]["errors"]["age"], json!("Age must be at least 18"));
        }
    }

    #[test]
    fn ffi_page_numbers() {
        let result = unsafe { take(dashkit_page_numbers(10, 20)) };
        assert_eq!(result, json!({"ok": [1, "...", 9, 10, 11, "...", 20]}));
    }

    #[test]
    fn ffi_version() {
        unsafe {
            let version = CStr::from_ptr(dashkit_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }

    #[test]
    fn ffi_error_handling() {
        unsafe {
            let result = take(dashkit_form_defaults(ptr::null()));
            assert_eq!(result, json!({"error": "invalid schema JSON"}));

            let bad = c("not valid json");
            let result = take(dashkit_filter_to_query(bad.as_ptr()));
            assert!(result["error"].as_str().unwrap().starts_with("parse error"));

            let schema = c(r#"{"fields": [{"name": "a", "type": "text"}, {"name": "a", "type": "text"}]}"#);
            let values = c("{}");
            let result = take(dashkit_form_validate(schema.as_ptr(), values.as_ptr()));
            assert!(result["error"].as_str().unwrap().contains("duplicate field name"));
        }
    }
}
