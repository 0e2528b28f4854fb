//! HTTP transport implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;
use tracing::instrument;

use super::{StreamingResponse, TransportError};

/// Streaming POST request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Absolute request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Vec<u8>,
    /// Time allowed for the response head. The body is not limited.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a new POST request.
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body,
            timeout: None,
        }
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response head timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP transport trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns as soon as the response head arrives.
    async fn send_streaming(&self, request: HttpRequest)
        -> Result<StreamingResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    client: Client,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport.
    pub fn new() -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(4)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        let mut req_builder = self.client.post(&request.url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        req_builder = req_builder.body(request.body);

        // Bounds the response head only. The body streams unbounded.
        let sent = match request.timeout {
            Some(timeout) => tokio::time::timeout(timeout, req_builder.send())
                .await
                .map_err(|_| TransportError::Timeout { timeout })?,
            None => req_builder.send().await,
        };

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    timeout: request.timeout.unwrap_or_default(),
                }
            } else if e.is_connect() {
                TransportError::Connection {
                    message: e.to_string(),
                }
            } else {
                TransportError::InvalidResponse {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        tracing::debug!(status, "Response head received");

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| TransportError::InvalidResponse {
                message: e.to_string(),
            })
        });
        let stream: Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>> =
            Box::pin(stream);

        Ok(StreamingResponse {
            status,
            headers,
            stream,
        })
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl").finish()
    }
}
