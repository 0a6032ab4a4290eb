//! Per-call request description.
//!
//! A `RequestDescriptor` is built fresh for every call and consumed by it.
//! The method stays a raw string until `RequestCodec::build` normalizes it,
//! so callers can pass verbs in any case.

use serde::Serialize;
use serde_json::Value;

use crate::error::RequestError;
use crate::form::MultipartForm;
use crate::http::HttpMethod;

/// Body supplied by the caller, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(MultipartForm),
}

/// Key for the client's in-flight guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dedupe {
    /// `METHOD url`, using the resolved URL.
    Endpoint,
    /// Explicit token shared by every call that represents the same action.
    Token(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    pub show_toast: bool,
    pub dedupe: Option<Dedupe>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: None,
            headers: Vec::new(),
            show_toast: true,
            dedupe: None,
        }
    }

    /// GET descriptor; the verb helpers on `RequestClient` replace the method.
    pub fn to(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get.as_str(), url)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Serialize any `Serialize` value as the JSON body.
    pub fn try_json<S: Serialize + ?Sized>(self, body: &S) -> Result<Self, RequestError> {
        let value = serde_json::to_value(body).map_err(|e| RequestError::Serialization(e.to_string()))?;
        Ok(self.json(value))
    }

    pub fn form(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Form(form));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn show_toast(mut self, show: bool) -> Self {
        self.show_toast = show;
        self
    }

    /// Refuse this call while another with the same method and URL is running.
    pub fn exclusive(mut self) -> Self {
        self.dedupe = Some(Dedupe::Endpoint);
        self
    }

    /// Refuse this call while another call carrying `token` is running.
    pub fn exclusive_with(mut self, token: impl Into<String>) -> Self {
        self.dedupe = Some(Dedupe::Token(token.into()));
        self
    }

    pub(crate) fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method.as_str().to_string();
        self
    }
}
