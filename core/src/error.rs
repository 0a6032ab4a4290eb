//! Error types for the request client.
//!
//! # Design
//! `RequestClient::send` never surfaces these; it reports them through the
//! notifier and returns `None`. They exist so `dispatch`, the codec and the
//! FFI layer can tell failure causes apart. `Failure` collapses the variants
//! into the four reporting classes the toast logic cares about.

/// Reporting class of a `RequestError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The request never produced a response: network, URL, encoding.
    Transport,
    /// Non-2xx status.
    Http,
    /// 2xx with `success: false`.
    Logic,
    /// Refused by the in-flight guard; reported only in the log.
    Silent,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Message is the server's `error` field, else the raw body text.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx but flagged `success: false`.
    #[error("request rejected: {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    /// The extracted payload does not match the type asked for.
    #[error("unexpected payload: {0}")]
    Decode(String),

    #[error("already in flight: {0}")]
    InFlight(String),
}

impl RequestError {
    pub fn failure(&self) -> Failure {
        match self {
            RequestError::Http { .. } => Failure::Http,
            RequestError::Rejected { .. } => Failure::Logic,
            RequestError::InFlight(_) => Failure::Silent,
            RequestError::UnsupportedMethod(_)
            | RequestError::InvalidUrl { .. }
            | RequestError::Serialization(_)
            | RequestError::Transport(_)
            | RequestError::Decode(_) => Failure::Transport,
        }
    }
}

/// The transport could not complete the round trip.
#[derive(Debug, thiserror::Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);
