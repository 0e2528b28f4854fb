//! HTTP transport layer.
//!
//! Provides the transport abstraction used to reach the provider and the
//! decoder that turns its streamed body into text deltas.

mod http;
mod streaming;

pub use http::{HttpRequest, HttpTransport, HttpTransportImpl};
pub use streaming::{ByteStream, DeltaDecoder, DeltaStream, StreamingResponse, DONE_SENTINEL, FRAME_PREFIX};

use std::time::Duration;

use crate::errors::PolishError;

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

impl From<TransportError> for PolishError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout } => PolishError::Timeout { timeout },
            other => PolishError::Network {
                message: other.to_string(),
            },
        }
    }
}
