//! Error types for polish sessions.
//!
//! Transport failures are classified by HTTP status so a session can show a
//! stable, human-readable message. Cancellation is never an error: a
//! cancelled stream simply ends.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for polish operations.
pub type PolishResult<T> = Result<T, PolishError>;

/// Message shown for HTTP 401 responses.
pub const CREDENTIAL_MESSAGE: &str = "Invalid API key. Check your settings.";

/// Message shown for HTTP 429 responses.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limited. Please wait and try again.";

/// Error type for polish operations.
#[derive(Debug, Error)]
pub enum PolishError {
    /// Invalid provider configuration (missing key, bad endpoint, ...).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Request input rejected before any network traffic.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
    },

    /// The provider rejected the credential (HTTP 401).
    #[error("{}", CREDENTIAL_MESSAGE)]
    Credential,

    /// The provider is throttling requests (HTTP 429).
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimit {
        /// Value of the `Retry-After` header, if the provider sent one.
        retry_after: Option<Duration>,
    },

    /// The configured model does not exist (HTTP 404).
    #[error("Model \"{model}\" not found. Check your settings.")]
    ModelNotFound {
        /// The requested model identifier.
        model: String,
    },

    /// Any other non-success status.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, or the reason phrase when the body was empty.
        body: String,
    },

    /// Connection could not be established or was reset.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// The request exceeded its timeout.
    #[error("Request timeout after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The byte stream failed after the response head was received.
    #[error("Stream error: {message}")]
    Stream {
        /// Error message.
        message: String,
        /// Content accumulated before the failure.
        partial_content: Option<String>,
    },

    /// Request serialization failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl PolishError {
    /// Classifies a non-success HTTP status.
    ///
    /// `model` is the identifier that was requested, used for 404s.
    pub fn from_status(
        status: u16,
        body: impl Into<String>,
        model: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            401 => PolishError::Credential,
            429 => PolishError::RateLimit { retry_after },
            404 => PolishError::ModelNotFound {
                model: model.to_string(),
            },
            _ => {
                let body = body.into();
                let body = if body.trim().is_empty() {
                    http::StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Unknown status")
                        .to_string()
                } else {
                    body
                };
                PolishError::Api { status, body }
            }
        }
    }

    /// The message stored on a failed session.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// A short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PolishError::Configuration { .. } => "configuration",
            PolishError::Validation { .. } => "validation",
            PolishError::Credential => "credential",
            PolishError::RateLimit { .. } => "rate_limit",
            PolishError::ModelNotFound { .. } => "model_not_found",
            PolishError::Api { .. } => "api",
            PolishError::Network { .. } => "network",
            PolishError::Timeout { .. } => "timeout",
            PolishError::Stream { .. } => "stream",
            PolishError::Serialization { .. } => "serialization",
        }
    }

    /// Returns the HTTP status this error was classified from, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PolishError::Credential => Some(401),
            PolishError::RateLimit { .. } => Some(429),
            PolishError::ModelNotFound { .. } => Some(404),
            PolishError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PolishError::Validation {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        PolishError::Configuration {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for PolishError {
    fn from(err: serde_json::Error) -> Self {
        PolishError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PolishError {
    fn from(err: url::ParseError) -> Self {
        PolishError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
