//! Stateless request builder and response classifier.
//!
//! # Design
//! `RequestCodec` holds only the base URL and carries no mutable state
//! between calls. `build` turns a `RequestDescriptor` into an `HttpRequest`;
//! `classify` turns an `HttpResponse` into the extracted payload or a
//! `RequestError`. The caller executes the actual HTTP round trip, keeping
//! both halves deterministic and free of I/O.

use serde_json::{Map, Value};
use url::Url;

use crate::descriptor::{RequestBody, RequestDescriptor};
use crate::error::RequestError;
use crate::http::{set_header, HttpBody, HttpMethod, HttpRequest, HttpResponse};

#[derive(Debug, Clone, Default)]
pub struct RequestCodec {
    base: Option<Url>,
}

impl RequestCodec {
    pub fn new(base_url: Option<&str>) -> Result<Self, RequestError> {
        let base = base_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| RequestError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self { base })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Resolve `url` the way a page resolves links against its own address.
    pub fn resolve(&self, url: &str) -> Result<Url, RequestError> {
        let invalid = |reason: String| RequestError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base {
                Some(base) => base.join(url).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative url and no base url configured".to_string())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    pub fn build(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, RequestError> {
        let method: HttpMethod = descriptor.method.parse()?;
        let url = self.resolve(&descriptor.url)?;

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        for (name, value) in &descriptor.headers {
            set_header(&mut headers, name, value);
        }

        let body = match &descriptor.body {
            Some(_) if !method.allows_body() => {
                log::debug!("dropping body on {method} {url}");
                None
            }
            Some(RequestBody::Json(value)) => {
                let text =
                    serde_json::to_string(value).map_err(|e| RequestError::Serialization(e.to_string()))?;
                set_header(&mut headers, "content-type", "application/json");
                Some(HttpBody::Json(text))
            }
            Some(RequestBody::Form(form)) => Some(HttpBody::Multipart(form.clone())),
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        })
    }

    pub fn classify(&self, response: &HttpResponse) -> Result<Value, RequestError> {
        classify(response)
    }
}

/// Map a response onto the envelope convention.
///
/// Non-2xx always fails. A 2xx JSON object with `success: false` fails. A 2xx
/// body that is not JSON (typically 204) succeeds with `{}`. Otherwise the
/// `data` field is returned when present and non-null, else the whole body.
pub fn classify(response: &HttpResponse) -> Result<Value, RequestError> {
    let parsed: Option<Value> = serde_json::from_str(&response.body).ok();

    if !response.is_success() {
        let message = parsed
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| response.body.trim().to_string());
        return Err(RequestError::Http {
            status: response.status,
            message,
        });
    }

    let Some(body) = parsed else {
        return Ok(Value::Object(Map::new()));
    };

    if body.get("success") == Some(&Value::Bool(false)) {
        return Err(RequestError::Rejected {
            message: error_message(&body),
        });
    }

    match body.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Ok(body),
    }
}

fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::MultipartForm;
    use serde_json::json;

    fn codec() -> RequestCodec {
        RequestCodec::new(Some("http://localhost:8000")).unwrap()
    }

    #[test]
    fn get_produces_bodyless_request() {
        let req = codec()
            .build(&RequestDescriptor::to("/bar/cocktails/").json(json!({"ignored": true})))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/bar/cocktails/");
        assert!(req.body.is_none());
        assert_eq!(req.headers, vec![("accept".to_string(), "application/json".to_string())]);
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = codec()
            .build(&RequestDescriptor::new("post", "/bar/cocktails/").json(json!({"name": "Negroni"})))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let Some(HttpBody::Json(text)) = &req.body else {
            panic!("expected json body, got {:?}", req.body);
        };
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body, json!({"name": "Negroni"}));
    }

    #[test]
    fn multipart_body_is_untouched() {
        let form = MultipartForm::new().text("name", "Lime");
        let req = codec()
            .build(&RequestDescriptor::new("POST", "/bar/ingredients/").form(form.clone()))
            .unwrap();
        assert_eq!(req.body, Some(HttpBody::Multipart(form)));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn caller_headers_override_accept() {
        let req = codec()
            .build(
                &RequestDescriptor::to("/page")
                    .header("Accept", "text/html")
                    .header("X-CSRFToken", "t0k"),
            )
            .unwrap();
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("x-csrftoken"), Some("t0k"));
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn json_content_type_wins_over_caller() {
        let req = codec()
            .build(
                &RequestDescriptor::new("put", "/x")
                    .header("Content-Type", "text/plain")
                    .json(json!(1)),
            )
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn absolute_url_ignores_base() {
        let req = codec().build(&RequestDescriptor::to("https://kp.example/api")).unwrap();
        assert_eq!(req.url, "https://kp.example/api");
    }

    #[test]
    fn relative_url_without_base_fails() {
        let err = RequestCodec::default().build(&RequestDescriptor::to("/x")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { .. }));
    }

    #[test]
    fn trailing_slash_base_joins_cleanly() {
        let codec = RequestCodec::new(Some("http://localhost:3000/")).unwrap();
        let req = codec.build(&RequestDescriptor::to("/bar/")).unwrap();
        assert_eq!(req.url, "http://localhost:3000/bar/");
    }

    #[test]
    fn unsupported_method_fails_build() {
        let err = codec().build(&RequestDescriptor::new("OPTIONS", "/x")).unwrap_err();
        assert!(matches!(err, RequestError::UnsupportedMethod(_)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(RequestCodec::new(Some("not a url")).is_err());
    }

    #[test]
    fn classify_data_field() {
        let resp = HttpResponse::new(200, r#"{"success":true,"data":{"id":7}}"#);
        assert_eq!(classify(&resp).unwrap(), json!({"id": 7}));
    }

    #[test]
    fn classify_plain_body() {
        let resp = HttpResponse::new(200, r#"[{"id":1}]"#);
        assert_eq!(classify(&resp).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn classify_null_data_falls_back_to_body() {
        let resp = HttpResponse::new(200, r#"{"success":true,"data":null}"#);
        assert_eq!(classify(&resp).unwrap(), json!({"success": true, "data": null}));
    }

    #[test]
    fn classify_empty_body_is_empty_object() {
        assert_eq!(classify(&HttpResponse::new(204, "")).unwrap(), json!({}));
        assert_eq!(classify(&HttpResponse::new(200, "<html>")).unwrap(), json!({}));
    }

    #[test]
    fn classify_http_error_prefers_error_field() {
        let err = classify(&HttpResponse::new(500, r#"{"error":"boom"}"#)).unwrap_err();
        assert!(matches!(err, RequestError::Http { status: 500, ref message } if message == "boom"));
    }

    #[test]
    fn classify_http_error_falls_back_to_text() {
        let err = classify(&HttpResponse::new(502, "Bad Gateway\n")).unwrap_err();
        assert!(matches!(err, RequestError::Http { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn classify_non_2xx_ignores_success_true() {
        let err = classify(&HttpResponse::new(404, r#"{"success":true,"data":1}"#)).unwrap_err();
        assert!(matches!(err, RequestError::Http { status: 404, .. }));
    }

    #[test]
    fn classify_logic_failure() {
        let err = classify(&HttpResponse::new(200, r#"{"success":false,"error":"in use"}"#)).unwrap_err();
        assert!(matches!(err, RequestError::Rejected { message: Some(ref m) } if m == "in use"));

        let err = classify(&HttpResponse::new(200, r#"{"success":false}"#)).unwrap_err();
        assert!(matches!(err, RequestError::Rejected { message: None }));
    }

    #[test]
    fn classify_success_must_be_literal_false() {
        let resp = HttpResponse::new(200, r#"{"success":0,"data":"x"}"#);
        assert_eq!(classify(&resp).unwrap(), json!("x"));
    }
}
