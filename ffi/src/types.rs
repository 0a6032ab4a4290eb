//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! for strings, a pointer plus length for header lists, explicit enum
//! discriminants. Conversions live here so `lib.rs` stays the `extern "C"`
//! surface only.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use request_core::{HttpBody, HttpMethod, Messages, RequestCodec, RequestError, Severity};
use serde_json::Value;

/// Toast hook: receives the message, its severity and the caller's
/// `user_data` pointer. The message is only valid during the call.
pub type RqToastCallback =
    Option<extern "C" fn(message: *const c_char, severity: FfiSeverity, user_data: *mut c_void)>;

/// Opaque handle to a codec plus its toast settings. C callers receive a
/// pointer to this and pass it back into every `rq_*` function.
pub struct FfiRequestCodec {
    pub(crate) inner: RequestCodec,
    pub(crate) messages: Messages,
    pub(crate) toast: RqToastCallback,
    pub(crate) user_data: *mut c_void,
}

impl FfiRequestCodec {
    pub(crate) fn new(inner: RequestCodec, messages: Messages) -> Self {
        Self {
            inner,
            messages,
            toast: None,
            user_data: std::ptr::null_mut(),
        }
    }

    pub(crate) fn notify(&self, message: &str, severity: Severity) {
        if let Some(callback) = self.toast {
            let message = c_string(message);
            callback(message.as_ptr(), severity.into(), self.user_data);
        }
    }
}

/// Interior NULs cannot cross the boundary; such text degrades to empty.
pub(crate) fn c_string(text: &str) -> CString {
    CString::new(text).unwrap_or_default()
}

fn into_raw(text: &str) -> *mut c_char {
    c_string(text).into_raw()
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSeverity {
    Success = 0,
    Error = 1,
    Info = 2,
}

impl From<Severity> for FfiSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Success => FfiSeverity::Success,
            Severity::Error => FfiSeverity::Error,
            Severity::Info => FfiSeverity::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// A ready-to-send request. The C caller performs the I/O and hands the
/// response back through `rq_parse_response`.
///
/// `url` is absolute. `body` is JSON text, or null when there is none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: request_core::HttpRequest) -> *mut Self {
        let body = match &req.body {
            Some(HttpBody::Json(text)) => into_raw(text),
            // Forms are not built through this interface.
            Some(HttpBody::Multipart(_)) | None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .iter()
                .map(|(name, value)| FfiHeader {
                    name: into_raw(name),
                    value: into_raw(value),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: into_raw(&req.url),
            headers,
            headers_len,
            body,
        }))
    }
}

/// Built by the C caller after executing a request. Read, never freed, by
/// this library. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// Non-2xx status.
    Http = 1,
    /// 2xx carrying `success: false`.
    Rejected = 2,
    InvalidArg = 3,
    Panic = 4,
    NullArg = 5,
}

/// Outcome of `rq_parse_response`.
///
/// On success `data` is the extracted value as JSON text and
/// `error_message` is null. On failure `data` is null and `error_message`
/// describes the cause. `http_status` is the status that was parsed, or 0
/// when no response was read.
#[repr(C)]
pub struct FfiRequestResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut c_char,
}

impl FfiRequestResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, http_status: u16, data: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiRequestResult {
            error_code,
            error_message,
            http_status,
            data,
        }))
    }

    pub(crate) fn ok(status: u16, value: &Value) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), status, into_raw(&value.to_string()))
    }

    pub(crate) fn from_error(status: u16, err: &RequestError) -> *mut Self {
        let code = match err {
            RequestError::Http { .. } => FfiErrorCode::Http,
            RequestError::Rejected { .. } => FfiErrorCode::Rejected,
            _ => FfiErrorCode::InvalidArg,
        };
        Self::boxed(code, into_raw(&err.to_string()), status, std::ptr::null_mut())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = format!("null argument: {name}");
        Self::boxed(FfiErrorCode::NullArg, into_raw(&msg), 0, std::ptr::null_mut())
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, into_raw(msg), 0, std::ptr::null_mut())
    }
}
