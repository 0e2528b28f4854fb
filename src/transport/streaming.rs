//! Streaming response decoding.
//!
//! The provider answers with newline-delimited frames. A frame is blank
//! (ignored), the terminal sentinel `data: [DONE]`, or `data: ` followed by
//! a chat completion chunk whose `choices[0].delta.content` is the next
//! piece of text. Anything else is skipped.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

use super::TransportError;
use crate::errors::{PolishError, PolishResult};
use crate::types::chat::ChatChunk;

/// Literal prefix of every delta-carrying frame.
pub const FRAME_PREFIX: &str = "data: ";

/// Frame that ends the stream.
pub const DONE_SENTINEL: &str = "data: [DONE]";

/// Boxed byte stream produced by a transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Streaming HTTP response.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Byte stream.
    pub stream: ByteStream,
}

impl StreamingResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Drains the body into a string. Read errors truncate the body.
    pub async fn into_text(mut self) -> String {
        let mut body = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            match chunk {
                Ok(bytes) => body.extend_from_slice(&bytes),
                Err(e) => {
                    tracing::debug!(error = %e, "Error body truncated");
                    break;
                }
            }
        }
        String::from_utf8_lossy(&body).into_owned()
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish()
    }
}

/// What a single line of the wire protocol means.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Skip,
    Done,
    Delta(String),
}

fn parse_frame(line: &str) -> Frame {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Frame::Skip;
    }

    if trimmed == DONE_SENTINEL {
        return Frame::Done;
    }

    let Some(payload) = trimmed.strip_prefix(FRAME_PREFIX) else {
        tracing::debug!(line = %trimmed, "Skipping frame without data prefix");
        return Frame::Skip;
    };

    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => match chunk.content() {
            Some(content) if !content.is_empty() => Frame::Delta(content.to_string()),
            _ => Frame::Skip,
        },
        Err(e) => {
            tracing::debug!(error = %e, data = %payload, "Failed to parse stream chunk");
            Frame::Skip
        }
    }
}

/// Incremental decoder from raw bytes to text deltas.
///
/// Bytes may arrive in any split: a line, or a multi-byte character, can
/// straddle two chunks. Once the sentinel is seen the decoder is done and
/// ignores further input.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: String,
    pending: Vec<u8>,
    done: bool,
}

impl DeltaDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the deltas of every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }

        self.decode_utf8(chunk);

        let mut deltas = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            match parse_frame(&line) {
                Frame::Delta(delta) => deltas.push(delta),
                Frame::Skip => {}
                Frame::Done => {
                    self.done = true;
                    self.buffer.clear();
                    self.pending.clear();
                    break;
                }
            }
        }

        deltas
    }

    /// Signals end of input and decodes a trailing line with no newline.
    pub fn finish(&mut self) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.done = true;

        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.push_str(&tail);
            self.pending.clear();
        }

        match parse_frame(&std::mem::take(&mut self.buffer)) {
            Frame::Delta(delta) => vec![delta],
            Frame::Skip | Frame::Done => Vec::new(),
        }
    }

    /// True once the sentinel was seen or input ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }
}

pin_project! {
    /// Cancellable stream of text deltas.
    ///
    /// Finite and non-restartable. When the cancellation token fires, the
    /// next pull returns `None` and the underlying byte stream is dropped.
    pub struct DeltaStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = PolishResult<String>> + Send>>,
        cancel: CancellationToken,
    }
}

impl DeltaStream {
    /// Wraps a byte stream.
    pub fn new(bytes: ByteStream, cancel: CancellationToken) -> Self {
        let token = cancel.clone();

        let inner = async_stream::stream! {
            let mut bytes = bytes;
            let mut decoder = DeltaDecoder::new();
            let mut received = String::new();

            'read: loop {
                let next = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("Delta stream cancelled");
                        break 'read;
                    }
                    next = bytes.next() => next,
                };

                let deltas = match next {
                    Some(Ok(chunk)) => decoder.feed(&chunk),
                    Some(Err(e)) => {
                        yield Err(PolishError::Stream {
                            message: e.to_string(),
                            partial_content: Some(received.clone()),
                        });
                        break 'read;
                    }
                    None => decoder.finish(),
                };

                for delta in deltas {
                    if token.is_cancelled() {
                        break 'read;
                    }
                    received.push_str(&delta);
                    yield Ok(delta);
                }

                if decoder.is_done() {
                    break 'read;
                }
            }

            drop(bytes);
            tracing::debug!(received_len = received.len(), "Delta stream released");
        };

        Self {
            inner: Box::pin(inner),
            cancel,
        }
    }

    /// A stream that ends immediately.
    pub fn empty(cancel: CancellationToken) -> Self {
        Self {
            inner: Box::pin(futures::stream::empty()),
            cancel,
        }
    }

    /// True if the stream ended (or will end) because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Concatenates every delta.
    pub async fn collect_text(mut self) -> PolishResult<String> {
        let mut text = String::new();
        while let Some(delta) = self.next().await {
            text.push_str(&delta?);
        }
        Ok(text)
    }
}

impl Stream for DeltaStream {
    type Item = PolishResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl std::fmt::Debug for DeltaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
            })
        )
    }

    fn byte_stream(chunks: Vec<Vec<u8>>) -> ByteStream {
        Box::pin(futures::stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from(c))),
        ))
    }

    #[test]
    fn test_decoder_single_frame() {
        let mut decoder = DeltaDecoder::new();
        assert_eq!(decoder.feed(frame("Hello").as_bytes()), vec!["Hello"]);
    }

    #[test]
    fn test_decoder_multiple_frames_in_one_chunk() {
        let mut decoder = DeltaDecoder::new();
        let chunk = format!("{}\n{}\n\n{}", frame("The"), frame(" cat"), frame(" sits."));

        assert_eq!(decoder.feed(chunk.as_bytes()), vec!["The", " cat", " sits."]);
    }

    #[test]
    fn test_decoder_frame_split_across_chunks() {
        let whole = frame("split");
        let mut single = DeltaDecoder::new();
        let expected = single.feed(whole.as_bytes());

        let mut decoder = DeltaDecoder::new();
        let first = decoder.feed(b"data: ");
        let second = decoder.feed(whole["data: ".len()..].as_bytes());

        assert!(first.is_empty());
        assert_eq!(second, expected);
        assert_eq!(second, vec!["split"]);
    }

    #[test]
    fn test_decoder_stops_at_sentinel() {
        let mut decoder = DeltaDecoder::new();
        let chunk = format!("{}data: [DONE]\n{}", frame("kept"), frame("dropped"));

        assert_eq!(decoder.feed(chunk.as_bytes()), vec!["kept"]);
        assert!(decoder.is_done());
        assert!(decoder.feed(frame("late").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_decoder_skips_malformed_and_foreign_lines() {
        let mut decoder = DeltaDecoder::new();
        let chunk = format!(
            ": keep-alive\nevent: ping\ndata: {{not json\ndata: 42\n{}",
            frame("ok")
        );

        assert_eq!(decoder.feed(chunk.as_bytes()), vec!["ok"]);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_decoder_skips_role_only_and_empty_content() {
        let mut decoder = DeltaDecoder::new();
        let chunk = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
                     data: {\"choices\":[]}\n";

        assert!(decoder.feed(chunk.as_bytes()).is_empty());
    }

    #[test]
    fn test_decoder_handles_crlf() {
        let mut decoder = DeltaDecoder::new();
        let chunk = frame("windows").replace('\n', "\r\n");

        assert_eq!(decoder.feed(chunk.as_bytes()), vec!["windows"]);
    }

    #[test]
    fn test_decoder_reassembles_split_utf8() {
        let whole = frame("你好");
        let bytes = whole.as_bytes();
        // Split inside the first three-byte character.
        let split = whole.find('你').unwrap() + 1;

        let mut decoder = DeltaDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(decoder.feed(&bytes[split..]), vec!["你好"]);
    }

    #[test]
    fn test_decoder_finish_flushes_trailing_line() {
        let mut decoder = DeltaDecoder::new();
        let whole = frame("tail");

        assert!(decoder.feed(whole.trim_end().as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
        assert!(decoder.is_done());
    }

    #[tokio::test]
    async fn test_delta_stream_collects_until_sentinel() {
        let body = format!("{}{}data: [DONE]\n{}", frame("A "), frame("B"), frame("C"));
        let stream = DeltaStream::new(
            byte_stream(vec![body.into_bytes()]),
            CancellationToken::new(),
        );

        assert_eq!(stream.collect_text().await.unwrap(), "A B");
    }

    #[tokio::test]
    async fn test_delta_stream_stops_when_cancelled() {
        let token = CancellationToken::new();
        let chunks = vec![frame("one").into_bytes(), frame("two").into_bytes()];
        let mut stream = DeltaStream::new(byte_stream(chunks), token.clone());

        assert_eq!(stream.next().await.unwrap().unwrap(), "one");
        token.cancel();

        assert!(stream.next().await.is_none());
        assert!(stream.is_cancelled());
    }

    #[test]
    fn test_delta_stream_cancel_wakes_pending_read() {
        let token = CancellationToken::new();
        let pending: ByteStream = Box::pin(futures::stream::pending());
        let mut stream = tokio_test::task::spawn(DeltaStream::new(pending, token.clone()));

        tokio_test::assert_pending!(stream.poll_next());

        token.cancel();

        assert!(stream.is_woken());
        let next = tokio_test::assert_ready!(stream.poll_next());
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_delta_stream_reports_read_error_with_partial_content() {
        let chunks: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from(frame("partial"))),
            Err(TransportError::InvalidResponse {
                message: "connection reset".to_string(),
            }),
        ]));
        let mut stream = DeltaStream::new(chunks, CancellationToken::new());

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        match stream.next().await {
            Some(Err(PolishError::Stream {
                partial_content, ..
            })) => assert_eq!(partial_content.as_deref(), Some("partial")),
            other => panic!("Expected stream error, got {:?}", other),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_delta_stream() {
        let stream = DeltaStream::empty(CancellationToken::new());
        assert_eq!(stream.collect_text().await.unwrap(), "");
    }
}
