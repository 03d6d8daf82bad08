/*
[INPUT]:  Error sources (HTTP, API status, parsing, signing, configuration, webhook listener)
[OUTPUT]: Structured error type with taxonomy helpers
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the onramp adapter
#[derive(Error, Debug)]
pub enum OnrampError {
    /// Transport-level failure (connect, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response decoded but is missing required data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JWT construction or signing failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Missing or malformed key material / settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected locally before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Webhook listener could not bind or serve
    #[error("Webhook listener error: {0}")]
    Webhook(String),
}

impl OnrampError {
    /// Check if the caller may reasonably retry the operation.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            OnrampError::Http(_) => true,
            OnrampError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if the provider reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, OnrampError::Api { status: 404, .. })
    }

    /// Check if the error is fatal before any network call is made
    pub fn is_config_error(&self) -> bool {
        matches!(self, OnrampError::Config(_) | OnrampError::Signing(_))
    }

    /// Create an API error from status code and response body
    pub fn api_error(status: StatusCode, body: impl Into<String>) -> Self {
        OnrampError::Api {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for onramp operations
pub type Result<T> = std::result::Result<T, OnrampError>;
