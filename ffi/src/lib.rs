//! C-ABI wrapper around `request-core`.
//!
//! # Overview
//! Exposes the sans-IO half of the request client: build a normalized HTTP
//! request, let the host perform the I/O, then classify the response. The
//! toast that `RequestClient::send` would raise is delivered through an
//! optional C callback.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Bodies are JSON text only. Multipart forms need the host's own encoder.
//! - The C caller owns all returned pointers and must call the matching
//!   `rq_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use request_core::{toast_for, ClientConfig, HttpResponse, RequestCodec, RequestDescriptor};
use serde_json::Value;

pub use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid text.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Codec lifecycle
// ---------------------------------------------------------------------------

/// Create a codec resolving relative URLs against `base_url`.
///
/// `base_url` may be null, in which case only absolute URLs can be built.
/// Returns null if `base_url` is not a valid URL. Free with `rq_codec_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rq_codec_new(base_url: *const c_char) -> *mut FfiRequestCodec {
    catch_unwind(|| {
        let base = if base_url.is_null() {
            None
        } else {
            match unsafe { str_arg(base_url) } {
                Some(url) => Some(url),
                None => return std::ptr::null_mut(),
            }
        };
        match RequestCodec::new(base) {
            Ok(codec) => Box::into_raw(Box::new(FfiRequestCodec::new(codec, Default::default()))),
            Err(e) => {
                log::warn!("rq_codec_new: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a codec from a JSON `ClientConfig` document, e.g.
/// `{"base_url": "https://bar.local", "messages": {"success": "Saved"}}`.
///
/// Returns null if `config_json` is null, not valid JSON or names an invalid
/// base URL.
#[unsafe(no_mangle)]
pub extern "C" fn rq_codec_from_config(config_json: *const c_char) -> *mut FfiRequestCodec {
    catch_unwind(|| {
        let Some(text) = (unsafe { str_arg(config_json) }) else {
            return std::ptr::null_mut();
        };
        let config: ClientConfig = match serde_json::from_str(text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("rq_codec_from_config: {e}");
                return std::ptr::null_mut();
            }
        };
        match RequestCodec::new(config.base_url.as_deref()) {
            Ok(codec) => Box::into_raw(Box::new(FfiRequestCodec::new(codec, config.messages))),
            Err(e) => {
                log::warn!("rq_codec_from_config: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a codec. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rq_codec_free(codec: *mut FfiRequestCodec) {
    if !codec.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(codec) });
        });
    }
}

/// Install (or with a null `callback`, remove) the toast hook.
///
/// `user_data` is passed back untouched on every call.
#[unsafe(no_mangle)]
pub extern "C" fn rq_set_toast_callback(
    codec: *mut FfiRequestCodec,
    callback: RqToastCallback,
    user_data: *mut c_void,
) {
    if codec.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let codec = unsafe { &mut *codec };
        codec.toast = callback;
        codec.user_data = user_data;
    });
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Build a normalized request.
///
/// `method` is matched case-insensitively. `json_body` may be null; a body
/// given for GET is dropped. Returns null on a null argument, an unsupported
/// method, an unresolvable URL or a body that is not valid JSON. Free with
/// `rq_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn rq_build_request(
    codec: *const FfiRequestCodec,
    method: *const c_char,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if codec.is_null() {
            return std::ptr::null_mut();
        }
        let codec = unsafe { &*codec };
        let (Some(method), Some(url)) = (unsafe { (str_arg(method), str_arg(url)) }) else {
            return std::ptr::null_mut();
        };

        let mut descriptor = RequestDescriptor::new(method, url);
        if !json_body.is_null() {
            let parsed = unsafe { str_arg(json_body) }.and_then(|text| serde_json::from_str::<Value>(text).ok());
            match parsed {
                Some(body) => descriptor = descriptor.json(body),
                None => {
                    log::warn!("rq_build_request: body for {method} {url} is not valid JSON");
                    return std::ptr::null_mut();
                }
            }
        }

        match codec.inner.build(&descriptor) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                log::warn!("rq_build_request: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Invalid UTF-8 in the body is replaced, not discarded.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    HttpResponse::new(resp.status, body)
}

/// Classify a response under the envelope convention and raise the matching
/// toast through the installed callback.
///
/// `show_toast` gates the success toast only. Free with `rq_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn rq_parse_response(
    codec: *const FfiRequestCodec,
    response: *const FfiHttpResponse,
    show_toast: bool,
) -> *mut FfiRequestResult {
    catch_unwind(|| {
        if codec.is_null() {
            return FfiRequestResult::null_arg("codec");
        }
        if response.is_null() {
            return FfiRequestResult::null_arg("response");
        }
        let codec = unsafe { &*codec };
        let resp = ffi_response_to_core(unsafe { &*response });

        let outcome = codec.inner.classify(&resp);
        if let Err(e) = &outcome {
            log::error!("response {} rejected: {e}", resp.status);
        }
        if let Some((message, severity)) = toast_for(&codec.messages, outcome.as_ref().err(), show_toast) {
            codec.notify(&message, severity);
        }

        match outcome {
            Ok(value) => FfiRequestResult::ok(resp.status, &value),
            Err(e) => FfiRequestResult::from_error(resp.status, &e),
        }
    })
    .unwrap_or_else(|_| FfiRequestResult::panic("panic in rq_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free a request returned by `rq_build_request`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rq_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize))
            };
            for h in headers.iter() {
                free_c_string(h.name);
                free_c_string(h.value);
            }
        }
    });
}

/// Free a result returned by `rq_parse_response`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rq_free_result(result: *mut FfiRequestResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.data);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rq_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
