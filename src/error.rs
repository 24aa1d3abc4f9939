//! Unified SDK error types.

use serde_json::Value;
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum DerivError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Page limit of {max_pages} reached before history was exhausted")]
    PageLimitExceeded { max_pages: u32 },

    #[error("Page ending at {page_newest} overlaps history starting at {series_oldest}")]
    OverlappingPage { page_newest: i64, series_oldest: i64 },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DerivError {
    /// The provider's error payload, if this error came from the provider.
    pub fn provider(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(e) => Some(e),
            _ => None,
        }
    }
}

/// Error reported by the quote provider inside an otherwise successful response.
///
/// `payload` is the raw `error` object exactly as the provider sent it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    /// `msg_type` of the response that carried the error.
    pub msg_type: Option<String>,
    pub payload: Value,
}

impl ProviderError {
    /// Build from the raw `error` object of a provider response.
    pub fn from_payload(payload: Value, msg_type: Option<String>) -> Self {
        let field = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            code: field("code"),
            message: field("message"),
            msg_type,
            payload,
        }
    }
}

/// Missing or malformed connection settings, raised before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{0} must be set (environment or .env file)")]
    Missing(&'static str),

    #[error("{0} is set but empty")]
    Empty(&'static str),

    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("Request {req_id} timed out after {after_ms}ms")]
    Timeout { req_id: u64, after_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_error_from_payload() {
        let payload = json!({
            "code": "InvalidSymbol",
            "message": "Symbol FOO is invalid.",
            "details": { "field": "ticks_history" }
        });
        let err = ProviderError::from_payload(payload.clone(), Some("ticks_history".into()));
        assert_eq!(err.code, "InvalidSymbol");
        assert_eq!(err.message, "Symbol FOO is invalid.");
        assert_eq!(err.payload, payload);
        assert_eq!(err.to_string(), "InvalidSymbol: Symbol FOO is invalid.");
    }

    #[test]
    fn test_provider_error_missing_fields() {
        let err = ProviderError::from_payload(json!({}), None);
        assert!(err.code.is_empty());
        assert!(err.message.is_empty());
    }

    #[test]
    fn test_deriv_error_provider_accessor() {
        let err: DerivError = ProviderError::from_payload(json!({"code": "RateLimit"}), None).into();
        assert_eq!(err.provider().map(|p| p.code.as_str()), Some("RateLimit"));

        let other = DerivError::Validation("bad".into());
        assert!(other.provider().is_none());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::Missing("DERIV_TOKEN");
        assert_eq!(
            err.to_string(),
            "DERIV_TOKEN must be set (environment or .env file)"
        );
    }
}
