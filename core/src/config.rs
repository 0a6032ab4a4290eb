//! Client configuration.
//!
//! Deserializable so hosts can load it from a JSON settings file; every field
//! has a default.

use serde::Deserialize;

pub const BASE_URL_ENV: &str = "REQUEST_BASE_URL";

/// Toast texts. Each failure toast is `"{prefix}: {detail}"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub success: String,
    pub transport_failure: String,
    pub server_error: String,
    pub app_error: String,
    pub unknown_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            success: "Success!".to_string(),
            transport_failure: "Could not complete the request".to_string(),
            server_error: "Server error".to_string(),
            app_error: "Error".to_string(),
            unknown_error: "Unknown error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base for relative URLs. Without it only absolute URLs can be fetched.
    pub base_url: Option<String>,
    pub messages: Messages,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: Some(base_url.to_string()),
            ..Self::default()
        }
    }

    /// Reads the base URL from `REQUEST_BASE_URL`, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV).ok().filter(|v| !v.is_empty()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"base_url":"http://localhost:8000","messages":{"success":"Готово"}}"#,
        )
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.messages.success, "Готово");
        assert_eq!(config.messages.server_error, "Server error");
    }

    #[test]
    fn empty_object_is_default() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
