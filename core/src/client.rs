//! The request client: one normalized way to call the server.
//!
//! # Design
//! `RequestClient` composes the stateless `RequestCodec` with a `Transport`
//! and a `Notifier`. `dispatch` runs the whole pipeline and returns the
//! classified `Result`; `send` wraps it, raises at most one toast, logs
//! failures, and hands the caller only `Some(value)` or `None`.
//!
//! The only mutable state is the in-flight guard used by descriptors marked
//! `exclusive`.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::RequestCodec;
use crate::config::ClientConfig;
use crate::descriptor::{Dedupe, RequestDescriptor};
use crate::error::{Failure, RequestError};
use crate::guard::InFlightGuard;
use crate::http::{HttpMethod, HttpRequest};
use crate::toast::{toast_for, LogNotifier, Notifier};
use crate::transport::Transport;

#[cfg(feature = "ureq")]
use crate::transport::UreqTransport;

pub struct RequestClient<T, N = LogNotifier> {
    codec: RequestCodec,
    config: ClientConfig,
    transport: T,
    notifier: N,
    in_flight: InFlightGuard,
}

#[cfg(feature = "ureq")]
impl RequestClient<UreqTransport, LogNotifier> {
    /// Client on a fresh `ureq` agent with toasts routed to the log.
    pub fn new(config: ClientConfig) -> Result<Self, RequestError> {
        Self::with_parts(config, UreqTransport::new(), LogNotifier)
    }
}

impl<T: Transport, N: Notifier> RequestClient<T, N> {
    pub fn with_parts(config: ClientConfig, transport: T, notifier: N) -> Result<Self, RequestError> {
        let codec = RequestCodec::new(config.base_url.as_deref())?;
        Ok(Self {
            codec,
            config,
            transport,
            notifier,
            in_flight: InFlightGuard::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn in_flight(&self) -> &InFlightGuard {
        &self.in_flight
    }

    pub fn get(&self, descriptor: RequestDescriptor) -> Option<Value> {
        self.send(descriptor.with_method(HttpMethod::Get))
    }

    pub fn post(&self, descriptor: RequestDescriptor) -> Option<Value> {
        self.send(descriptor.with_method(HttpMethod::Post))
    }

    pub fn put(&self, descriptor: RequestDescriptor) -> Option<Value> {
        self.send(descriptor.with_method(HttpMethod::Put))
    }

    pub fn patch(&self, descriptor: RequestDescriptor) -> Option<Value> {
        self.send(descriptor.with_method(HttpMethod::Patch))
    }

    pub fn delete(&self, descriptor: RequestDescriptor) -> Option<Value> {
        self.send(descriptor.with_method(HttpMethod::Delete))
    }

    /// Perform the call and report it. `None` means it did not succeed.
    pub fn send(&self, descriptor: RequestDescriptor) -> Option<Value> {
        let show_toast = descriptor.show_toast;
        let outcome = self.dispatch(&descriptor);
        self.report(&descriptor, outcome.as_ref().err(), show_toast);
        outcome.ok()
    }

    /// `send`, then deserialize the extracted value into `R`.
    ///
    /// A payload of the wrong shape is reported as a failed request.
    pub fn send_as<R: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Option<R> {
        let show_toast = descriptor.show_toast;
        let outcome = self.dispatch(&descriptor).and_then(|value| {
            serde_json::from_value::<R>(value).map_err(|e| RequestError::Decode(e.to_string()))
        });
        self.report(&descriptor, outcome.as_ref().err(), show_toast);
        outcome.ok()
    }

    /// Run the pipeline without raising toasts or logging failures.
    pub fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<Value, RequestError> {
        let request = self.codec.build(descriptor)?;

        let _ticket = match &descriptor.dedupe {
            Some(dedupe) => {
                let key = dedupe_key(dedupe, &request);
                match self.in_flight.try_acquire(&key) {
                    Some(ticket) => Some(ticket),
                    None => return Err(RequestError::InFlight(key)),
                }
            }
            None => None,
        };

        let response = self.transport.execute(&request)?;
        self.codec.classify(&response)
    }

    fn report(&self, descriptor: &RequestDescriptor, failure: Option<&RequestError>, show_toast: bool) {
        let method = descriptor.method.to_ascii_uppercase();
        let url = &descriptor.url;
        match failure {
            None => log::debug!("{method} {url} succeeded"),
            Some(err) => match err.failure() {
                Failure::Silent => log::debug!("{method} {url} skipped: {err}"),
                Failure::Http => log::error!("{method} {url} failed: {err}"),
                Failure::Logic => log::error!("API error from {method} {url}: {err}"),
                Failure::Transport => log::error!("request {method} {url} failed: {err}"),
            },
        }
        if let Some((message, severity)) = toast_for(&self.config.messages, failure, show_toast) {
            self.notifier.notify(&message, severity);
        }
    }
}

impl<T, N> Deref for RequestClient<T, N> {
    type Target = RequestCodec;

    fn deref(&self) -> &RequestCodec {
        &self.codec
    }
}

fn dedupe_key(dedupe: &Dedupe, request: &HttpRequest) -> String {
    match dedupe {
        Dedupe::Endpoint => format!("{} {}", request.method, request.url),
        Dedupe::Token(token) => token.clone(),
    }
}
