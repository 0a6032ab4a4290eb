//! The I/O half of the client.
//!
//! A `Transport` executes one `HttpRequest` and hands back the raw
//! `HttpResponse`. Non-2xx statuses are data, not errors; only a failed
//! round trip is a `TransportError`.

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Hops followed before a redirect chain is given up on.
pub const MAX_REDIRECTS: usize = 10;

pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Method and body for the next hop, as a browser `fetch` would pick them.
///
/// 303 turns anything but GET into a bodiless GET; 301 and 302 do the same
/// for POST only. 307 and 308 replay the request unchanged.
pub fn redirected(
    status: u16,
    method: HttpMethod,
    body: Option<&HttpBody>,
) -> (HttpMethod, Option<&HttpBody>) {
    match (status, method) {
        (303, m) if m != HttpMethod::Get => (HttpMethod::Get, None),
        (301 | 302, HttpMethod::Post) => (HttpMethod::Get, None),
        _ => (method, body),
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use ureq::http::Response;
    use ureq::typestate::WithBody;
    use ureq::unversioned::multipart::{Form, Part};
    use ureq::{Agent, Body, RequestBuilder};
    use url::Url;

    use super::{is_redirect, redirected, Transport, MAX_REDIRECTS};
    use crate::error::TransportError;
    use crate::form::{MultipartForm, PartValue};
    use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse};

    /// Largest response body read into memory.
    const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

    /// Blocking transport on a shared `ureq` agent.
    ///
    /// 4xx/5xx responses come back as data rather than `Err`, letting the
    /// codec do the status interpretation. Redirects are followed here rather
    /// than by ureq, which refuses to replay a body on 307/308.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .max_redirects(0)
                .build()
                .new_agent();
            Self { agent }
        }

        fn send_once(
            &self,
            method: HttpMethod,
            url: &str,
            headers: &[(String, String)],
            body: Option<&HttpBody>,
        ) -> Result<Response<Body>, TransportError> {
            match (method, body) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call().map_err(transport_error),
                (HttpMethod::Delete, None) => {
                    with_headers(self.agent.delete(url), headers).call().map_err(transport_error)
                }
                (HttpMethod::Delete, body) => {
                    send_body(with_headers(self.agent.delete(url).force_send_body(), headers), body)
                }
                (HttpMethod::Post, body) => send_body(with_headers(self.agent.post(url), headers), body),
                (HttpMethod::Put, body) => send_body(with_headers(self.agent.put(url), headers), body),
                (HttpMethod::Patch, body) => send_body(with_headers(self.agent.patch(url), headers), body),
            }
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut method = request.method;
            let mut url = request.url.clone();
            let mut body = request.body.as_ref();

            for _ in 0..=MAX_REDIRECTS {
                let response = self.send_once(method, &url, &request.headers, body)?;
                let status = response.status().as_u16();
                let location = response
                    .headers()
                    .get("location")
                    .and_then(|v| v.to_str().ok())
                    .filter(|_| is_redirect(status))
                    .map(str::to_string);

                let Some(location) = location else {
                    return read_response(response);
                };
                let next = Url::parse(&url)
                    .and_then(|current| current.join(&location))
                    .map_err(|e| TransportError(format!("bad redirect to {location}: {e}")))?;
                (method, body) = redirected(status, method, body);
                log::debug!("{status} redirect {url} -> {next}");
                url = next.into();
            }
            Err(TransportError(format!("too many redirects from {}", request.url)))
        }
    }

    fn send_body(builder: RequestBuilder<WithBody>, body: Option<&HttpBody>) -> Result<Response<Body>, TransportError> {
        let result = match body {
            None => builder.send_empty(),
            Some(HttpBody::Json(text)) => builder.send(text.as_bytes()),
            Some(HttpBody::Multipart(form)) => builder.send(wire_form(form)?),
        };
        result.map_err(transport_error)
    }

    /// ureq sets the `multipart/form-data` content type and boundary.
    fn wire_form(form: &MultipartForm) -> Result<Form<'_>, TransportError> {
        let mut wire = Form::new();
        for part in form.parts() {
            wire = match &part.value {
                PartValue::Text(text) => wire.text(&part.name, text),
                PartValue::File {
                    file_name,
                    content_type,
                    data,
                } => {
                    let mut file = Part::bytes(data).file_name(file_name);
                    if let Some(content_type) = content_type {
                        file = file.mime_str(content_type).map_err(transport_error)?;
                    }
                    wire.part(&part.name, file)
                }
            };
        }
        Ok(wire)
    }

    /// Body bytes are decoded lossily, like a browser's `response.text()`.
    fn read_response(mut response: Response<Body>) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn transport_error(e: ureq::Error) -> TransportError {
        TransportError(e.to_string())
    }
}
