//! Mock implementations for testing.
//!
//! [`MockTransport`] replays scripted streaming responses without a
//! network, records every request, and counts how many response bodies
//! were released.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::transport::{HttpRequest, HttpTransport, StreamingResponse, TransportError, DONE_SENTINEL};

/// Formats one delta-carrying frame, newline included.
pub fn frame(content: &str) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "mock-model",
            "choices": [{
                "index": 0,
                "delta": {"content": content},
                "finish_reason": null
            }]
        })
    )
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Body chunks, delivered in order.
    pub chunks: Vec<Bytes>,
    /// Pause before each chunk.
    pub chunk_delay: Option<Duration>,
    /// Pause before the response head is returned.
    pub head_delay: Option<Duration>,
    /// Read error raised after the last chunk.
    pub trailing_error: Option<String>,
    /// Keep the body open (pending forever) after the last chunk.
    pub hold_open: bool,
}

impl MockResponse {
    /// Creates a 200 response from raw body chunks.
    pub fn chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/event-stream".to_string());

        Self {
            status: 200,
            headers,
            chunks: chunks.into_iter().map(Into::into).collect(),
            chunk_delay: None,
            head_delay: None,
            trailing_error: None,
            hold_open: false,
        }
    }

    /// Creates a 200 response with one frame per delta and the sentinel.
    pub fn deltas(deltas: &[&str]) -> Self {
        let mut chunks: Vec<String> = deltas.iter().map(|d| frame(d)).collect();
        chunks.push(format!("{}\n", DONE_SENTINEL));
        Self::chunks(chunks)
    }

    /// Creates a response with an OpenAI-style JSON error body.
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": "error"
            }
        })
        .to_string();

        let mut response = Self::raw(status, body);
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        response
    }

    /// Creates a response with a plain body.
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::chunks(vec![body.into()]);
        response.status = status;
        response.headers.clear();
        response
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Delays every chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Delays the response head.
    pub fn with_head_delay(mut self, delay: Duration) -> Self {
        self.head_delay = Some(delay);
        self
    }

    /// Fails the body read after the last chunk.
    pub fn with_trailing_error(mut self, message: &str) -> Self {
        self.trailing_error = Some(message.to_string());
        self
    }

    /// Never finishes the body after the last chunk.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock HTTP transport for testing.
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<MockResponse>>,
    released: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Sets the response used once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns how many response bodies have been dropped.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            lock(&self.default_response)
                .clone()
                .unwrap_or_else(|| MockResponse::error(500, "No mock response configured"))
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        lock(&self.requests).push(request);

        let response = self.next_response();

        if let Some(delay) = response.head_delay {
            tokio::time::sleep(delay).await;
        }

        let guard = ReleaseGuard(Arc::clone(&self.released));
        let MockResponse {
            status,
            headers,
            chunks,
            chunk_delay,
            trailing_error,
            hold_open,
            ..
        } = response;

        let stream = async_stream::stream! {
            let _guard = guard;
            for chunk in chunks {
                if let Some(delay) = chunk_delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(chunk);
            }
            if let Some(message) = trailing_error {
                yield Err(TransportError::InvalidResponse { message });
            }
            if hold_open {
                futures::future::pending::<()>().await;
            }
        };

        Ok(StreamingResponse {
            status,
            headers,
            stream: Box::pin(stream),
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}
