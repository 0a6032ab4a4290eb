//! Request client core: one normalized way to call the application server.
//!
//! # Overview
//! `RequestClient` turns a `RequestDescriptor` into a single HTTP round trip
//! and folds the outcome into `Some(payload)` or `None`, raising one toast
//! through an injected `Notifier` along the way.
//!
//! # Design
//! - `RequestCodec` is the sans-IO half: `build` produces an `HttpRequest`,
//!   `classify` applies the `{success, error, data}` envelope convention to
//!   an `HttpResponse`. Both are deterministic and touch no network.
//! - `Transport` is the I/O seam. `UreqTransport` (feature `ureq`) is the
//!   default blocking implementation; the FFI crate lets a C host do the
//!   I/O itself.
//! - Failure causes are kept in `RequestError` for `dispatch` and the FFI
//!   layer, while `send` absorbs them.
//! - An optional keyed in-flight guard refuses duplicate submissions of the
//!   same action.

pub mod client;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod form;
pub mod guard;
pub mod http;
pub mod toast;
pub mod transport;

pub use client::RequestClient;
pub use codec::{classify, RequestCodec};
pub use config::{ClientConfig, Messages};
pub use descriptor::{Dedupe, RequestBody, RequestDescriptor};
pub use error::{Failure, RequestError, TransportError};
pub use form::{MultipartForm, Part, PartValue};
pub use guard::InFlightGuard;
pub use http::{HttpBody, HttpMethod, HttpRequest, HttpResponse};
pub use toast::{toast_for, LogNotifier, Notifier, Severity};
pub use transport::Transport;

#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
