//! Toast notifications.
//!
//! The client does not own any UI. It is handed a `Notifier` at construction
//! and calls it at most once per request.

use std::fmt;

use crate::config::Messages;
use crate::error::{Failure, RequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of transient user-facing messages.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

impl<F> Notifier for F
where
    F: Fn(&str, Severity),
{
    fn notify(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

/// Writes toasts to the `log` facade. Default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => log::warn!(target: "toast", "{message}"),
            Severity::Success | Severity::Info => log::info!(target: "toast", "[{severity}] {message}"),
        }
    }
}

/// The toast a finished call should raise, if any.
///
/// `show_toast` only gates the success toast; failures are always shown,
/// except calls refused by the in-flight guard.
/// `failure` is `None` for a successful call.
pub fn toast_for(
    messages: &Messages,
    failure: Option<&RequestError>,
    show_toast: bool,
) -> Option<(String, Severity)> {
    let err = match failure {
        None if show_toast => return Some((messages.success.clone(), Severity::Success)),
        None => return None,
        Some(err) => err,
    };
    let text = match (err.failure(), err) {
        (Failure::Silent, _) => return None,
        (Failure::Http, RequestError::Http { status, message }) if !message.is_empty() => {
            format!("{}: {status} {message}", messages.server_error)
        }
        (Failure::Http, RequestError::Http { status, .. }) => {
            format!("{}: {status}", messages.server_error)
        }
        (Failure::Logic, RequestError::Rejected { message }) => format!(
            "{}: {}",
            messages.app_error,
            message.as_deref().unwrap_or(&messages.unknown_error)
        ),
        _ => messages.transport_failure.clone(),
    };
    Some((text, Severity::Error))
}
